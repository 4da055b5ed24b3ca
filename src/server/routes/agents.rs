//! Session-scoped routes: the caller's agents, meetings and meetings report.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{attachment, json_body, required};
use crate::db::{
    AgentCreate, DbAgent, DbAgentWithMeetings, DbMeeting, DbMeetingDetail, MeetingCreate,
};
use crate::error::MeetmindError;
use crate::reports::meetings::meetings_report_pdf;
use crate::server::guards::session::CurrentUser;
use crate::server::router::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/agents", get(list_agents).post(create_agent))
        .route("/api/meetings", get(list_meetings).post(create_meeting))
        .route("/api/meetings/report", get(meetings_report))
}

fn check_agent_name(name: &str) -> Result<(), MeetmindError> {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        Ok(())
    } else {
        Err(MeetmindError::bad_request(
            "Name can only contain letters, numbers, and spaces.",
        ))
    }
}

/// GET /api/agents
pub async fn list_agents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DbAgentWithMeetings>>, MeetmindError> {
    Ok(Json(state.db.list_agents(user.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewAgent {
    pub name: Option<String>,
    pub instructions: Option<String>,
}

/// POST /api/agents
pub async fn create_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewAgent>, JsonRejection>,
) -> Result<Json<DbAgent>, MeetmindError> {
    let body = json_body(payload)?;
    let name = required("name", body.name)?;
    check_agent_name(&name)?;
    let instructions = required("instructions", body.instructions)?;

    let agent = state
        .db
        .create_agent(AgentCreate {
            user_id: user.user_id,
            name,
            instructions,
        })
        .await?;
    info!(agent_id = %agent.id, "agent created");
    Ok(Json(agent))
}

/// GET /api/meetings
pub async fn list_meetings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DbMeetingDetail>>, MeetmindError> {
    Ok(Json(state.db.list_meetings(user.user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeeting {
    pub name: Option<String>,
    pub agent_id: Option<String>,
}

/// POST /api/meetings
pub async fn create_meeting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewMeeting>, JsonRejection>,
) -> Result<Json<DbMeeting>, MeetmindError> {
    let body = json_body(payload)?;
    let name = required("name", body.name)?;
    let agent_id = required("agentId", body.agent_id)?;

    let meeting = state
        .db
        .create_meeting(MeetingCreate {
            user_id: user.user_id,
            agent_id,
            name,
        })
        .await?
        .ok_or(MeetmindError::NotFound("Agent not found"))?;
    info!(meeting_id = %meeting.id, agent_id = %meeting.agent_id, "meeting created");
    Ok(Json(meeting))
}

/// GET /api/meetings/report
pub async fn meetings_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, MeetmindError> {
    let meetings = state.db.list_meetings(user.user_id.clone()).await?;
    let now = Utc::now();
    let bytes = meetings_report_pdf(&user, &meetings, now)?;
    info!(
        user_id = %user.user_id,
        meetings = meetings.len(),
        bytes = bytes.len(),
        "meetings report rendered"
    );
    Ok(attachment(
        "application/pdf",
        &format!("MeetMind-Meetings-Report-{}.pdf", now.format("%Y-%m-%d")),
        bytes,
    ))
}
