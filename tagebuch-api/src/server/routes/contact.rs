use crate::server::{
    Result, ServerError, ServerRouter,
    extract::Json,
    forms::{FieldErrors, FormErrorBody, unprocessable, validated},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tagebuch_common::model::contact::{
    CreateContactMessage, EmailAddress, MessageBody, SenderName, Subject,
};
use tagebuch_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(contact)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contact", rejection(ServerError))]
struct ContactPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct ContactForm {
    name: String,
    email: String,
    subject: String,
    message: String,
}

async fn contact(
    _: ContactPath,
    State(db): State<Arc<DbClient>>,
    Json(form): Json<ContactForm>,
) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let name = validated(&mut errors, "name", SenderName::new(form.name));
    let email = validated(&mut errors, "email", EmailAddress::new(form.email));
    let subject = validated(&mut errors, "subject", Subject::new(form.subject));
    let message = validated(&mut errors, "message", MessageBody::new(form.message));

    let (Some(name), Some(email), Some(subject), Some(message)) = (name, email, subject, message)
    else {
        return Ok(unprocessable(FormErrorBody { errors }));
    };

    let create = CreateContactMessage {
        name,
        email,
        subject,
        message,
    };
    db.create_contact_message(&create).await?;

    Ok(Redirect::to("/").into_response())
}
