use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    forms::{FieldErrors, unprocessable},
    routes::posts::{CommentPageParams, load_post_detail},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tagebuch_common::{
    model::{
        Id,
        comment::{CommentMarker, CommentText},
        post::PostMarker,
    },
    pager::PageNumber,
};
use tagebuch_db::client::DbClient;

/// Fragment anchor for the comment area on a post's detail page.
const COMMENTS_FRAGMENT: &str = "comments-section";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_comment)
        .typed_post(delete_comment)
}

/// Deep link back into a post's comment area with the pager reset, so the
/// newly created comment is visible.
fn new_comment_location(post_id: Id<PostMarker>) -> String {
    format!("/post/{post_id}?page=1#{COMMENTS_FRAGMENT}")
}

fn comment_area_location(post_id: Id<PostMarker>) -> String {
    format!("/post/{post_id}#{COMMENTS_FRAGMENT}")
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/{id}", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct CommentForm {
    text: String,
}

async fn create_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(params): Query<CommentPageParams>,
    Json(form): Json<CommentForm>,
) -> Result<Response> {
    // An unknown post is not-found before any text validation happens.
    if !db.post_exists(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    match CommentText::new(form.text) {
        Ok(text) => {
            db.create_comment(id, user.user_id(), &text).await?;

            Ok(Redirect::to(&new_comment_location(id)).into_response())
        }
        Err(invalid_text) => {
            // Nothing was persisted: return the detail context for the page
            // the client was on, with the field error attached.
            let requested = PageNumber::from_param(params.page.as_deref());
            let mut detail = load_post_detail(&db, id, requested).await?;

            let mut errors = FieldErrors::new();
            errors.push("text", invalid_text);
            detail.errors = Some(errors);

            Ok(unprocessable(detail))
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/{post_id}/comment/{comment_id}/delete", rejection(ServerError))]
struct CommentDeletePath {
    post_id: Id<PostMarker>,
    comment_id: Id<CommentMarker>,
}

async fn delete_comment(
    CommentDeletePath {
        post_id,
        comment_id,
    }: CommentDeletePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Redirect> {
    // Ownership is part of the lookup: a comment owned by someone else is
    // reported as missing, never as forbidden.
    if db
        .delete_own_comment(comment_id, post_id, user.user_id())
        .await?
    {
        Ok(Redirect::to(&comment_area_location(post_id)))
    } else {
        Err(ServerError::CommentByIdNotFound(comment_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::server::routes::comments::{comment_area_location, new_comment_location};

    #[test]
    fn comment_redirects_target_the_thread() {
        assert_eq!(new_comment_location(7.into()), "/post/7?page=1#comments-section");
        assert_eq!(comment_area_location(7.into()), "/post/7#comments-section");
    }
}
