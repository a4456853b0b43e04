//! Typed surface of the dashboard REST API

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use studioboard_proto::{
    EntityId, Item, ItemDraft, ItemPatch, Progress, Project, ProjectDraft, ProjectPatch, Task,
    TaskDeletion, TaskDraft, TaskMutation, TaskPatch, TaskStatus, TeamMember, TeamMemberDraft,
    TeamMemberPatch,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// One method per backend endpoint, over a shared [`Transport`]
#[derive(Clone)]
pub struct StudioApi {
    transport: Arc<dyn Transport>,
}

impl StudioApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// API client over HTTP for the given configuration
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Send a request that must answer with a JSON body of type `T`
    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let value = self
            .transport
            .send(request)
            .await?
            .ok_or(ApiError::EmptyResponse(path))?;

        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request whose body is optional
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        match self.transport.send(request).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    fn body<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
        serde_json::to_value(payload).map_err(|e| ApiError::Encode(e.to_string()))
    }

    // ========================
    // Projects
    // ========================

    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.fetch(ApiRequest::get("/projects")).await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, ApiError> {
        self.fetch(ApiRequest::post("/projects", Self::body(draft)?))
            .await
    }

    pub async fn update_project(
        &self,
        id: &EntityId,
        patch: &ProjectPatch,
    ) -> Result<Project, ApiError> {
        self.fetch(ApiRequest::put(format!("/projects/{}", id), Self::body(patch)?))
            .await
    }

    pub async fn update_project_progress(
        &self,
        id: &EntityId,
        progress: Progress,
    ) -> Result<Project, ApiError> {
        self.fetch(ApiRequest::patch(
            format!("/projects/{}/progress", id),
            json!({ "progress": progress }),
        ))
        .await
    }

    pub async fn delete_project(&self, id: &EntityId) -> Result<(), ApiError> {
        self.transport
            .send(ApiRequest::delete(format!("/projects/{}", id)))
            .await?;
        Ok(())
    }

    // ========================
    // Tasks
    // ========================

    pub async fn get_tasks(&self, project_id: &EntityId) -> Result<Vec<Task>, ApiError> {
        self.fetch(ApiRequest::get(format!("/tasks/project/{}", project_id)))
            .await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<TaskMutation, ApiError> {
        self.fetch(ApiRequest::post("/tasks", Self::body(draft)?))
            .await
    }

    /// `None` when the backend acknowledges without a body
    pub async fn set_task_status(
        &self,
        id: &EntityId,
        status: TaskStatus,
    ) -> Result<Option<TaskMutation>, ApiError> {
        self.fetch_optional(ApiRequest::patch(
            format!("/tasks/{}/status", id),
            json!({ "status": status }),
        ))
        .await
    }

    pub async fn update_task(
        &self,
        id: &EntityId,
        patch: &TaskPatch,
    ) -> Result<TaskMutation, ApiError> {
        self.fetch(ApiRequest::patch(format!("/tasks/{}", id), Self::body(patch)?))
            .await
    }

    pub async fn delete_task(&self, id: &EntityId) -> Result<TaskDeletion, ApiError> {
        let deletion = self
            .fetch_optional(ApiRequest::delete(format!("/tasks/{}", id)))
            .await?;
        Ok(deletion.unwrap_or_default())
    }

    // ========================
    // Team members
    // ========================

    pub async fn get_team_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        self.fetch(ApiRequest::get("/team-members")).await
    }

    pub async fn create_team_member(
        &self,
        draft: &TeamMemberDraft,
    ) -> Result<TeamMember, ApiError> {
        self.fetch(ApiRequest::post("/team-members", Self::body(draft)?))
            .await
    }

    pub async fn update_team_member(
        &self,
        id: &EntityId,
        patch: &TeamMemberPatch,
    ) -> Result<TeamMember, ApiError> {
        self.fetch(ApiRequest::patch(
            format!("/team-members/{}", id),
            Self::body(patch)?,
        ))
        .await
    }

    pub async fn delete_team_member(&self, id: &EntityId) -> Result<(), ApiError> {
        self.transport
            .send(ApiRequest::delete(format!("/team-members/{}", id)))
            .await?;
        Ok(())
    }

    // ========================
    // Items
    // ========================

    pub async fn get_items(&self) -> Result<Vec<Item>, ApiError> {
        self.fetch(ApiRequest::get("/items")).await
    }

    pub async fn get_item(&self, id: &EntityId) -> Result<Item, ApiError> {
        self.fetch(ApiRequest::get(format!("/items/{}", id))).await
    }

    pub async fn create_item(&self, draft: &ItemDraft) -> Result<Item, ApiError> {
        self.fetch(ApiRequest::post("/items", Self::body(draft)?))
            .await
    }

    pub async fn update_item(&self, id: &EntityId, patch: &ItemPatch) -> Result<Item, ApiError> {
        self.fetch(ApiRequest::put(format!("/items/{}", id), Self::body(patch)?))
            .await
    }

    pub async fn delete_item(&self, id: &EntityId) -> Result<(), ApiError> {
        self.transport
            .send(ApiRequest::delete(format!("/items/{}", id)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use studioboard_proto::TaskSummary;

    fn project_json(id: &str, progress: u8) -> Value {
        json!({
            "_id": id,
            "name": "Seaside Villa",
            "status": "In Progress",
            "progress": progress,
            "studio": "Core",
            "color": "#2563eb",
            "createdAt": "2024-05-01T08:00:00Z"
        })
    }

    fn task_json(id: &str, status: &str) -> Value {
        json!({
            "_id": id,
            "title": "Survey site",
            "status": status,
            "project": "p1",
            "createdAt": "2024-05-02T08:00:00Z"
        })
    }

    fn api(mock: MockTransport) -> StudioApi {
        StudioApi::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_get_projects() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| r.method == Method::GET && r.path == "/projects" && r.body.is_none())
            .times(1)
            .returning(|_| Ok(Some(json!([project_json("p1", 10), project_json("p2", 20)]))));

        let projects = api(mock).get_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].progress.value(), 20);
    }

    #[tokio::test]
    async fn test_update_progress_sends_clamped_value() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| {
                r.method == Method::PATCH
                    && r.path == "/projects/p1/progress"
                    && r.body == Some(json!({ "progress": 100 }))
            })
            .times(1)
            .returning(|_| Ok(Some(project_json("p1", 100))));

        let project = api(mock)
            .update_project_progress(&EntityId::new("p1"), Progress::new(140.0))
            .await
            .unwrap();
        assert_eq!(project.progress.value(), 100);
    }

    #[tokio::test]
    async fn test_update_project_uses_put() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| {
                r.method == Method::PUT
                    && r.path == "/projects/p1"
                    && r.body == Some(json!({ "name": "Harbour Loft" }))
            })
            .times(1)
            .returning(|_| Ok(Some(project_json("p1", 0))));

        let patch = ProjectPatch {
            name: Some("Harbour Loft".to_string()),
            ..Default::default()
        };
        api(mock)
            .update_project(&EntityId::new("p1"), &patch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_task_reads_envelope() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| r.method == Method::POST && r.path == "/tasks")
            .times(1)
            .returning(|_| {
                Ok(Some(json!({
                    "task": task_json("t1", "Pending"),
                    "project": { "_id": "p1", "taskSummary": { "total": 1, "completed": 0 } }
                })))
            });

        let draft = TaskDraft::new("Survey site", EntityId::new("p1"));
        let mutation = api(mock).create_task(&draft).await.unwrap();

        assert_eq!(mutation.task.id.as_str(), "t1");
        assert_eq!(
            mutation.project.unwrap().task_summary,
            Some(TaskSummary::new(1, 0))
        );
    }

    #[tokio::test]
    async fn test_set_task_status_without_body() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| {
                r.method == Method::PATCH
                    && r.path == "/tasks/t1/status"
                    && r.body == Some(json!({ "status": "Complete" }))
            })
            .times(1)
            .returning(|_| Ok(None));

        let result = api(mock)
            .set_task_status(&EntityId::new("t1"), TaskStatus::Complete)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_task_no_content() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| r.method == Method::DELETE && r.path == "/tasks/t1")
            .times(1)
            .returning(|_| Ok(None));

        let deletion = api(mock).delete_task(&EntityId::new("t1")).await.unwrap();
        assert!(deletion.project.is_none());
    }

    #[tokio::test]
    async fn test_team_member_update_uses_patch() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|r| r.method == Method::PATCH && r.path == "/team-members/m1")
            .times(1)
            .returning(|_| {
                Ok(Some(json!({
                    "_id": "m1",
                    "name": "Ada",
                    "role": "Lead Architect",
                    "email": "ada@studio.test",
                    "createdAt": "2024-01-01T00:00:00Z"
                })))
            });

        let patch = TeamMemberPatch {
            role: Some("Lead Architect".to_string()),
            ..Default::default()
        };
        let member = api(mock)
            .update_team_member(&EntityId::new("m1"), &patch)
            .await
            .unwrap();
        assert_eq!(member.role, "Lead Architect");
        assert_eq!(member.capacity, 5);
    }

    #[tokio::test]
    async fn test_missing_body_is_an_error() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| Ok(None));

        let err = api(mock).get_item(&EntityId::new("i1")).await.unwrap_err();
        assert_eq!(err, ApiError::EmptyResponse("/items/i1".to_string()));
    }

    #[tokio::test]
    async fn test_status_error_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Err(ApiError::Status {
                status: 404,
                message: "Item not found".to_string(),
            })
        });

        let err = api(mock).delete_item(&EntityId::new("i9")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Item not found");
    }

    #[test]
    fn test_unserializable_body_is_an_encode_error() {
        let mut payload = std::collections::HashMap::new();
        payload.insert((1u8, 2u8), "not a string key");

        let err = StudioApi::body(&payload).unwrap_err();
        assert!(matches!(err, ApiError::Encode(_)));
        assert!(err.to_string().starts_with("Invalid request body"));
    }
}
