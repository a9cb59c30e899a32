use crate::cookies::CookieStorage;
use crate::error::AppError;
use crate::render;
use crate::state::AppState;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use domain::VoteOption;
use serde::Deserialize;
use vote_guard::VoteGuard;
use vote_view::ViewState;

const RETRY_NOTICE: &str = "Your vote was not recorded. Please try again.";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(live_handler))
        .route("/vote", get(vote_page_handler).post(cast_vote_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct VoteQuery {
    piece: Option<usize>,
    details: Option<bool>,
    /// `all` expands the comment list
    comments: Option<String>,
    retry: Option<bool>,
}

impl VoteQuery {
    fn view_state(&self) -> Result<ViewState, AppError> {
        let current = match self.piece {
            Some(index) => VoteOption::from_index(index).ok_or(AppError::InvalidPiece(index))?,
            None => VoteOption::First,
        };
        Ok(ViewState {
            current,
            show_details: self.details.unwrap_or(false),
            comments_expanded: self.comments.as_deref() == Some("all"),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    option: usize,
    /// Piece on screen when the vote was cast, kept across the redirect
    piece: Option<usize>,
}

async fn live_handler(State(state): State<AppState>) -> Html<String> {
    Html(render::live_page(&state.live.display()))
}

async fn vote_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VoteQuery>,
) -> Result<Html<String>, AppError> {
    let view_state = query.view_state()?;
    let mut view = state.vote_view(VoteGuard::new(CookieStorage::from_headers(&headers)));
    view.restore(view_state);
    view.load().await;

    if !view.is_ready() {
        return Ok(Html(render::loading_page()));
    }
    let notice = query.retry.unwrap_or(false).then_some(RETRY_NOTICE);
    Ok(Html(render::vote_page(&view, notice)))
}

async fn cast_vote_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<VoteForm>,
) -> Result<Response, AppError> {
    let option = VoteOption::from_index(form.option).ok_or(AppError::InvalidOption(form.option))?;
    let back = render::vote_href(ViewState {
        current: form
            .piece
            .and_then(VoteOption::from_index)
            .unwrap_or(VoteOption::First),
        ..ViewState::default()
    });

    let mut view = state.vote_view(VoteGuard::new(CookieStorage::from_headers(&headers)));
    if view.cast_vote(option).await.is_err() {
        return Ok(Redirect::to(&format!("{back}&retry=true")).into_response());
    }

    let cookies = view.into_guard().into_storage().set_cookie_headers();
    let mut response = Redirect::to(&back).into_response();
    for cookie in cookies {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn health_handler() -> &'static str {
    "ok"
}
