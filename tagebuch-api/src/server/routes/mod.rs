use crate::server::ServerRouter;
use axum::Router;

mod accounts;
mod comments;
mod contact;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(accounts::routes())
        .merge(contact::routes())
}
