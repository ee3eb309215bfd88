use crate::server::{
    Result, ServerError, ServerRouter,
    auth::Superuser,
    extract::{Json, Query},
    forms::{FieldErrors, unprocessable, validated},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tagebuch_common::{
    model::{
        Id,
        category::{Category, CategoryMarker},
        comment::Comment,
        post::{CreatePost, PopularPost, Post, PostMarker, PostTitle},
    },
    pager::{COMMENTS_PER_PAGE, POPULAR_POSTS_COUNT, POSTS_PER_PAGE, Page, PageNumber},
};
use tagebuch_db::{client::DbClient, query::PostQuery};

const NO_RESULTS_NOTICE: &str = "No results found for your search.";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(index)
        .typed_get(post_detail)
        .typed_get(post_create_form)
        .typed_post(post_create)
        .typed_get(post_update_form)
        .typed_post(post_update)
        .typed_get(post_delete_confirm)
        .typed_post(post_delete)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct IndexPath();

/// Raw filter/search/page parameters. All of them are parsed leniently: an
/// invalid value is indistinguishable from an absent one.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    category: Option<String>,
    search_term: Option<String>,
    page: Option<String>,
}

/// The filter/search form state echoed back to the client: the resolved
/// category, the term, and the choices for the category select.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FilterState {
    category: Option<Category>,
    search_term: Option<String>,
    categories: Vec<Category>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct IndexResponse {
    page: Page<Post>,
    filter: FilterState,
    notice: Option<String>,
    popular_posts: Vec<PopularPost>,
}

async fn index(
    _: IndexPath,
    State(db): State<Arc<DbClient>>,
    Query(params): Query<ListParams>,
) -> Result<Json<IndexResponse>> {
    // A category value that does not parse or does not resolve falls through
    // to "no filter".
    let active_category = match params
        .category
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
    {
        Some(raw_id) => db.fetch_category(raw_id.into()).await?,
        None => None,
    };

    let search_term = params
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(ToOwned::to_owned);

    let mut query = PostQuery::new();
    if let Some(category) = &active_category {
        query = query.category(category.id);
    }
    if let Some(term) = &search_term {
        query = query.search(term);
    }

    let requested = PageNumber::from_param(params.page.as_deref());
    let page = db.fetch_posts(&query, requested, POSTS_PER_PAGE).await?;

    let notice =
        (search_term.is_some() && page.total_items == 0).then(|| NO_RESULTS_NOTICE.to_owned());

    let categories = db.fetch_categories().await?;
    let popular_posts = db.fetch_popular_posts(POPULAR_POSTS_COUNT).await?;

    Ok(Json(IndexResponse {
        page,
        filter: FilterState {
            category: active_category,
            search_term,
            categories,
        },
        notice,
        popular_posts,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/{id}", rejection(ServerError))]
struct PostDetailPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentPageParams {
    pub page: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub(crate) struct PostDetailResponse {
    pub post: Post,
    pub comments: Page<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// The detail context both the GET view and the comment gate's re-render
/// path build: the post plus one page of its comments, newest first.
pub(crate) async fn load_post_detail(
    db: &DbClient,
    id: Id<PostMarker>,
    requested: PageNumber,
) -> Result<PostDetailResponse> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let comments = db.fetch_comments(id, requested, COMMENTS_PER_PAGE).await?;

    Ok(PostDetailResponse {
        post,
        comments,
        errors: None,
    })
}

async fn post_detail(
    PostDetailPath { id }: PostDetailPath,
    State(db): State<Arc<DbClient>>,
    Query(params): Query<CommentPageParams>,
) -> Result<Json<PostDetailResponse>> {
    let requested = PageNumber::from_param(params.page.as_deref());
    let response = load_post_detail(&db, id, requested).await?;

    Ok(Json(response))
}

/// Raw post-form submission; validated field by field so every problem
/// surfaces in one response.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct PostForm {
    title: String,
    content: String,
    image: Option<String>,
    categories: Vec<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct PostFormContext {
    categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

/// Unlike the index filter, a form category that does not resolve is a field
/// error: the choices were presented, so a stale id means invalid input.
async fn validate_post_form(
    db: &DbClient,
    form: PostForm,
) -> Result<std::result::Result<CreatePost, FieldErrors>> {
    let mut errors = FieldErrors::new();

    let title = validated(&mut errors, "title", PostTitle::new(form.title));
    if form.content.trim().is_empty() {
        errors.push("content", "Content is required");
    }

    let mut category_ids: Vec<Id<CategoryMarker>> =
        form.categories.iter().copied().map(Id::from).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let resolved = db.fetch_categories_by_ids(&category_ids).await?;
    if resolved.len() != category_ids.len() {
        errors.push("categories", "Select a valid choice");
    }

    let image = form.image.filter(|image| !image.trim().is_empty());

    Ok(match title {
        Some(title) if errors.is_empty() => Ok(CreatePost {
            title,
            content: form.content,
            image,
            categories: category_ids,
        }),
        _ => Err(errors),
    })
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/create", rejection(ServerError))]
struct PostCreatePath();

async fn post_create_form(
    _: PostCreatePath,
    State(db): State<Arc<DbClient>>,
    _: Superuser,
) -> Result<Json<PostFormContext>> {
    let categories = db.fetch_categories().await?;

    Ok(Json(PostFormContext {
        categories,
        post: None,
        errors: None,
    }))
}

async fn post_create(
    _: PostCreatePath,
    State(db): State<Arc<DbClient>>,
    superuser: Superuser,
    Json(form): Json<PostForm>,
) -> Result<Response> {
    match validate_post_form(&db, form).await? {
        Ok(create) => {
            let post_id = db.create_post(&create, superuser.user().id).await?;

            Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
        }
        Err(errors) => {
            let categories = db.fetch_categories().await?;

            Ok(unprocessable(PostFormContext {
                categories,
                post: None,
                errors: Some(errors),
            }))
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/{id}/update", rejection(ServerError))]
struct PostUpdatePath {
    id: Id<PostMarker>,
}

async fn post_update_form(
    PostUpdatePath { id }: PostUpdatePath,
    State(db): State<Arc<DbClient>>,
    _: Superuser,
) -> Result<Json<PostFormContext>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let categories = db.fetch_categories().await?;

    Ok(Json(PostFormContext {
        categories,
        post: Some(post),
        errors: None,
    }))
}

async fn post_update(
    PostUpdatePath { id }: PostUpdatePath,
    State(db): State<Arc<DbClient>>,
    _: Superuser,
    Json(form): Json<PostForm>,
) -> Result<Response> {
    match validate_post_form(&db, form).await? {
        Ok(update) => {
            if db.update_post(id, &update).await? {
                Ok(Redirect::to(&format!("/post/{id}")).into_response())
            } else {
                Err(ServerError::PostByIdNotFound(id))
            }
        }
        Err(errors) => {
            let post = db
                .fetch_post(id)
                .await?
                .ok_or(ServerError::PostByIdNotFound(id))?;
            let categories = db.fetch_categories().await?;

            Ok(unprocessable(PostFormContext {
                categories,
                post: Some(post),
                errors: Some(errors),
            }))
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/{id}/delete", rejection(ServerError))]
struct PostDeletePath {
    id: Id<PostMarker>,
}

async fn post_delete_confirm(
    PostDeletePath { id }: PostDeletePath,
    State(db): State<Arc<DbClient>>,
    _: Superuser,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn post_delete(
    PostDeletePath { id }: PostDeletePath,
    State(db): State<Arc<DbClient>>,
    _: Superuser,
) -> Result<Redirect> {
    if db.delete_post(id).await? {
        Ok(Redirect::to("/"))
    } else {
        Err(ServerError::PostByIdNotFound(id))
    }
}
