//! Controller dispatch: action resolution, fallbacks, binding, results, CORS.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use mvc_web::config::{ModelConfig, RouteConfig};
use mvc_web::mvc::{RequireAuthenticated, RequireParams};
use mvc_web::{ActionMethod, ActionResult, Application, ApplicationBuilder, Controller};

mod common;

fn items() -> Controller {
    Controller::new()
        .action(
            ActionMethod::new("getItem", |_ctx, _args| {
                Box::pin(async { Ok(ActionResult::content("read item")) })
            })
            .http_action("item")
            .get(),
        )
        .action(
            ActionMethod::new("patchItem", |_ctx, _args| {
                Box::pin(async { Ok(ActionResult::content("patched item")) })
            })
            .http_action("item")
            .patch(),
        )
        .action(
            ActionMethod::new("show", |ctx, args| {
                Box::pin(async move {
                    Ok(ActionResult::json(json!({
                        "controller": ctx.controller,
                        "id": args.get("id"),
                        "q": args.get("q"),
                    })))
                })
            })
            .params(&["id", "q"]),
        )
        .action(ActionMethod::new("changePassword", |_ctx, _args| {
            Box::pin(async { Ok(ActionResult::content("changed")) })
        }))
        .action(ActionMethod::new("away", |_ctx, _args| {
            Box::pin(async { Ok(ActionResult::redirect("/items/show")) })
        }))
        .action(ActionMethod::with_callback("legacy", |_ctx, _args, callback| {
            callback.done(Ok(ActionResult::content("called back")));
        }))
        .action(ActionMethod::with_callback("forgetful", |_ctx, _args, _done| {}))
        .action(
            ActionMethod::new("secret", |ctx, _args| {
                Box::pin(async move {
                    let name = ctx.user.as_ref().map(|u| u.name.clone()).unwrap_or_default();
                    Ok(ActionResult::content(format!("hello {name}")))
                })
            })
            .consume(Arc::new(RequireAuthenticated)),
        )
        .action(
            ActionMethod::new("search", |_ctx, args| {
                Box::pin(async move { Ok(ActionResult::content(args.get_str("term").unwrap_or_default())) })
            })
            .params(&["term"])
            .consume(Arc::new(RequireParams::new(&["term"]))),
        )
        .without_default_action()
}

fn app_with(builder: ApplicationBuilder, routes: Vec<RouteConfig>) -> Arc<Application> {
    common::build(builder.controller("items", items), common::config_with_routes(routes))
}

fn items_app() -> Arc<Application> {
    app_with(Application::builder(), vec![RouteConfig::new("/:controller/:action")])
}

#[tokio::test]
async fn test_same_action_different_verbs() {
    let app = items_app();

    let response = common::get(&app, "/items/item").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, "read item");

    let response = common::send(&app, Method::PATCH, "/items/item", &[], "").await;
    assert_eq!(common::body_text(response).await, "patched item");

    let response = common::send(&app, Method::DELETE, "/items/item", &[], "").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_dashed_action_finds_camel_case_method() {
    let app = items_app();
    let response = common::get(&app, "/items/change-password").await;
    assert_eq!(common::body_text(response).await, "changed");
}

#[tokio::test]
async fn test_unknown_action_without_default_is_not_found() {
    let app = items_app();
    let response = common::get(&app, "/items/nothing-here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_and_query_params_bind_to_arguments() {
    let app = app_with(
        Application::builder(),
        vec![RouteConfig {
            controller: Some("Items".into()),
            action: Some("show".into()),
            ..RouteConfig::new("/api/items/:id")
        }],
    );

    let response = common::get(&app, "/api/items/42?q=blue").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::header(&response, "content-type"),
        Some("application/json;charset=utf-8")
    );
    assert_eq!(
        common::body_json(response).await,
        json!({ "controller": "items", "id": "42", "q": "blue" })
    );
}

#[tokio::test]
async fn test_missing_arguments_are_omitted_from_json() {
    let app = items_app();
    let response = common::get(&app, "/items/show").await;
    assert_eq!(common::body_json(response).await, json!({ "controller": "items" }));
}

#[tokio::test]
async fn test_json_body_binds_as_data() {
    let app = common::build(
        Application::builder().controller("echo", || {
            Controller::new().action(
                ActionMethod::new("save", |_ctx, args| {
                    Box::pin(async move { Ok(ActionResult::json(args.get("data").cloned().unwrap_or_default())) })
                })
                .post()
                .params(&["data"]),
            )
        }),
        common::config_with_routes(vec![RouteConfig::new("/:controller/:action")]),
    );

    let response = common::send(
        &app,
        Method::POST,
        "/echo/save",
        &[("content-type", "application/json")],
        r#"{"name":"gear","tags":["a","b"]}"#,
    )
    .await;
    assert_eq!(
        common::body_json(response).await,
        json!({ "name": "gear", "tags": ["a", "b"] })
    );

    let response = common::send(
        &app,
        Method::POST,
        "/echo/save",
        &[("content-type", "application/json")],
        "{not json",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_form_body_uses_bracket_notation() {
    let app = common::build(
        Application::builder().controller("forms", || {
            Controller::new().action(
                ActionMethod::new("submit", |_ctx, args| {
                    Box::pin(async move {
                        Ok(ActionResult::json(json!({ "user": args.get("user"), "tags": args.get("tags") })))
                    })
                })
                .params(&["user", "tags"]),
            )
        }),
        common::config_with_routes(vec![RouteConfig::new("/:controller/:action")]),
    );

    let response = common::send(
        &app,
        Method::POST,
        "/forms/submit",
        &[("content-type", "application/x-www-form-urlencoded")],
        "user%5Bname%5D=ana&user%5Bage%5D=30&tags%5B%5D=x&tags%5B%5D=y",
    )
    .await;
    assert_eq!(
        common::body_json(response).await,
        json!({ "user": { "name": "ana", "age": "30" }, "tags": ["x", "y"] })
    );
}

#[tokio::test]
async fn test_redirect_result() {
    let app = items_app();
    let response = common::get(&app, "/items/away").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(common::header(&response, "location"), Some("/items/show"));
}

#[tokio::test]
async fn test_callback_actions() {
    let app = items_app();

    let response = common::get(&app, "/items/legacy").await;
    assert_eq!(common::body_text(response).await, "called back");

    let response = common::get(&app, "/items/forgetful").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_consumers_guard_actions() {
    let mut config = common::config_with_routes(vec![RouteConfig::new("/:controller/:action")]);
    config.settings.auth.users.push(mvc_web::config::UserCredentials {
        name: "alice".into(),
        password: "secret".into(),
    });
    let app = common::build(Application::builder().controller("items", items), config);

    let response = common::get(&app, "/items/secret").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = common::send(
        &app,
        Method::GET,
        "/items/secret",
        &[("authorization", "Basic YWxpY2U6c2VjcmV0")],
        "",
    )
    .await;
    assert_eq!(common::body_text(response).await, "hello alice");

    let response = common::send(
        &app,
        Method::GET,
        "/items/secret",
        &[("authorization", "Basic YWxpY2U6d3Jvbmc=")],
        "",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = common::send(&app, Method::GET, "/items/secret", &[("authorization", "Basic YSBiOng=")], "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = common::get(&app, "/items/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_text(response).await, "400 Missing parameter term\n");

    let response = common::get(&app, "/items/search?term=bolts").await;
    assert_eq!(common::body_text(response).await, "bolts");
}

#[tokio::test]
async fn test_model_type_controller_fallback() {
    let mut config = common::config_with_routes(vec![RouteConfig::new("/:controller/:action")]);
    config.models = vec![
        ModelConfig {
            name: "gadgets".into(),
            model_type: None,
        },
        ModelConfig {
            name: "reports".into(),
            model_type: Some("view".into()),
        },
    ];
    let builder = Application::builder().controller("data", || {
        Controller::new().default_action(ActionMethod::new("action", |ctx, _args| {
            Box::pin(async move {
                Ok(ActionResult::content(format!(
                    "data controller for {}",
                    ctx.controller.clone().unwrap_or_default()
                )))
            })
        }))
    });
    let app = common::build(builder, config);

    let response = common::get(&app, "/gadgets/index").await;
    assert_eq!(common::body_text(response).await, "data controller for gadgets");

    // No `view` controller registered: the base controller renders a view,
    // and there are no view engines.
    let response = common::get(&app, "/reports/index").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_views_render_through_engines() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "views/pages/about.html.tpl", "<h1>{{title}}</h1>");
    common::write_file(dir.path(), "views/shared/help.html.tpl", "help for {{topic}}");

    let mut config = common::config_with_routes(vec![RouteConfig {
        controller: Some("pages".into()),
        ..RouteConfig::new("/pages/:action")
    }]);
    config.settings.root = dir.path().to_string_lossy().into_owned();
    let app = common::build(Application::builder().view_engine(common::MustacheLite), config);

    let response = common::get(&app, "/pages/about?title=Gears").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::header(&response, "content-type"), Some("text/html;charset=utf-8"));
    assert_eq!(common::body_text(response).await, "<h1>Gears</h1>");

    let response = common::get(&app, "/pages/help?topic=bolts").await;
    assert_eq!(common::body_text(response).await, "help for bolts");

    let response = common::get(&app, "/pages/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_text(response).await, "404 View missing cannot be found\n");
}

#[tokio::test]
async fn test_cors_headers_on_mapped_requests() {
    let app = app_with(
        Application::builder(),
        vec![
            RouteConfig {
                allow_origin: Some("https://shop.test".into()),
                allow_credentials: Some(false),
                ..RouteConfig::new("/private/:action")
            },
            RouteConfig::new("/:controller/:action"),
        ],
    );

    let response = common::send(
        &app,
        Method::OPTIONS,
        "/items/item",
        &[("origin", "https://any.test")],
        "",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::header(&response, "access-control-allow-origin"), Some("https://any.test"));
    assert_eq!(common::header(&response, "access-control-allow-credentials"), Some("true"));
    assert_eq!(
        common::header(&response, "access-control-allow-methods"),
        Some("GET, OPTIONS, PUT, POST, DELETE")
    );

    let response = common::send(
        &app,
        Method::OPTIONS,
        "/private/item",
        &[("origin", "https://any.test")],
        "",
    )
    .await;
    assert_eq!(common::header(&response, "access-control-allow-origin"), None);
    assert_eq!(common::header(&response, "access-control-allow-credentials"), Some("false"));
}

#[tokio::test]
async fn test_restricted_locations_are_forbidden() {
    let app = items_app();
    let response = common::get(&app, "/Views/items/item.html.tpl").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
