use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserRecord;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signup = warp::post()
        .and(warp::path("signup"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signup);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(bearer_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::me);

    signup.or(login).or(refresh).or(logout).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn bearer_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        |header: String| async move {
            match header.strip_prefix("Bearer ") {
                Some(token) if !token.is_empty() => Ok(token.to_owned()),
                _ => Err(reject::custom(ApiErrorCode::Unauthorized)),
            }
        },
    )
}

/// Request-authentication filter: the factory checks the token
/// cryptographically, then the store confirms the session is still
/// active and resolves the acting user. Either failing rejects the
/// request with one generic unauthenticated outcome.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserRecord,), Error = warp::Rejection> + Clone {
    bearer_token().and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            auth_service
                .resolve_access_token(&token)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}
