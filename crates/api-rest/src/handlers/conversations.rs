use crate::error::ApiError;
use crate::identity::RequireUser;
use crate::AppState;
use api_shared::{
    ChatMessageRes, ConversationRes, ErrorRes, LatestConversationQuery, LatestConversationRes,
    ReplyConversationReq, ReplyConversationRes, StartConversationReq, StartConversationRes,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
};
use cutis_core::conversation::Conversation;

#[utoipa::path(
    post,
    path = "/conversations",
    request_body = StartConversationReq,
    params(("x-user-id" = String, Header, description = "Signed-in user")),
    responses(
        (status = 200, description = "Conversation started", body = StartConversationRes),
        (status = 400, description = "Empty message or malformed history id", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 404, description = "No medical history to discuss", body = ErrorRes),
        (status = 503, description = "No conversation model configured", body = ErrorRes)
    )
)]
/// Start a conversation about a medical history entry (the newest one by default).
pub async fn start_conversation(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(req): Json<StartConversationReq>,
) -> Result<Json<StartConversationRes>, ApiError> {
    let started = state
        .services
        .conversations
        .start(&user_id, &req.message, req.history_id.as_deref())
        .await?;
    Ok(Json(StartConversationRes {
        success: true,
        conversation_id: started.conversation_id.to_string(),
        reply: started.reply,
    }))
}

#[utoipa::path(
    post,
    path = "/conversations/{id}/reply",
    request_body = ReplyConversationReq,
    params(
        ("id" = String, Path, description = "Conversation id"),
        ("x-user-id" = String, Header, description = "Signed-in user")
    ),
    responses(
        (status = 200, description = "Assistant reply", body = ReplyConversationRes),
        (status = 400, description = "Empty message", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 404, description = "No such conversation for the caller", body = ErrorRes),
        (status = 503, description = "No conversation model configured", body = ErrorRes)
    )
)]
/// Continue a conversation.
pub async fn reply_conversation(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ReplyConversationReq>,
) -> Result<Json<ReplyConversationRes>, ApiError> {
    let reply = state
        .services
        .conversations
        .reply(&user_id, &id, &req.message)
        .await?;
    Ok(Json(ReplyConversationRes {
        success: true,
        reply,
    }))
}

#[utoipa::path(
    get,
    path = "/conversations/latest",
    params(
        LatestConversationQuery,
        ("x-user-id" = String, Header, description = "Signed-in user")
    ),
    responses(
        (status = 200, description = "Newest conversation, or null", body = LatestConversationRes),
        (status = 400, description = "Malformed history id", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes)
    )
)]
/// The caller's newest conversation, optionally limited to one history entry.
pub async fn latest_conversation(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Query(query): Query<LatestConversationQuery>,
) -> Result<Json<LatestConversationRes>, ApiError> {
    let conversation = state
        .services
        .conversations
        .latest(&user_id, query.history_id.as_deref())
        .await?;
    Ok(Json(LatestConversationRes {
        success: true,
        conversation: conversation.map(conversation_res),
    }))
}

fn conversation_res(conversation: Conversation) -> ConversationRes {
    ConversationRes {
        id: conversation.id.to_string(),
        history_id: conversation.history_id.to_string(),
        analysis: conversation.analysis,
        messages: conversation
            .messages
            .into_iter()
            .map(|m| ChatMessageRes {
                role: m.role.as_str().to_string(),
                content: m.content,
                timestamp: m.timestamp.to_rfc3339(),
            })
            .collect(),
        created_at: conversation.created_at.to_rfc3339(),
    }
}
