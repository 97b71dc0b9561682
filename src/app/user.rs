//! Account handlers: registration, profile, verification, password
//! reset, and token issuance.
//!
//! All handlers speak through the request context: collaborators come in
//! via the services handle, failures leave as `ApiStatus` values.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::{ApiStatus, HandlerResult, HttpMethod, RequestContext};
use crate::app::pages;
use crate::app::{authenticated, Services};
use crate::auth::{is_strong_password, PASSWORD_RULES};
use crate::storage::{User, UserPatch};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn str_field<'a>(body: &'a Map<String, Value>, key: &str) -> Result<&'a str, ApiStatus> {
    body.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiStatus::bad_request(format!("Body key '{key}' must be a string")))
}

/// `/api/user` — method-dispatched account resource.
pub fn account(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    match ctx.method {
        HttpMethod::Post => register(ctx),
        HttpMethod::Get => profile(ctx),
        HttpMethod::Patch => update(ctx),
        HttpMethod::Delete => remove(ctx),
        // PUT is declared on the route but has no implementation.
        _ => Ok(HandlerResult::Status(ApiStatus::not_implemented())),
    }
}

fn register(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let body = ctx.require_body(&["name", "email", "password"])?;
    let name = str_field(body, "name")?;
    let email = str_field(body, "email")?;
    let password = str_field(body, "password")?;

    let services = &ctx.services;
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: services.passwords.hash(password),
        email_verified: false,
        created_at: now_secs(),
    };
    let user_id = user.id;
    services.users.create(user)?;

    let token = services.tokens.issue(user_id, services.verification_ttl());
    services.mail.send_verification(email, &token);

    Ok(HandlerResult::Status(ApiStatus::created()))
}

fn profile(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let user = authenticated(ctx)?;
    let mut record = Map::new();
    record.insert("id".into(), json!(user.id.to_string()));
    record.insert("name".into(), json!(user.name));
    record.insert("email".into(), json!(user.email));
    record.insert("email_verified".into(), json!(user.email_verified));
    record.insert("created_at".into(), json!(user.created_at));
    Ok(HandlerResult::Object(record))
}

fn update(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let user = authenticated(ctx)?;
    let body = ctx.require_body(&[])?;
    let services = &ctx.services;

    let mut patch = UserPatch::default();
    if body.contains_key("name") {
        patch.name = Some(str_field(body, "name")?.to_string());
    }
    if body.contains_key("email") {
        let email = str_field(body, "email")?;
        patch.email = Some(email.to_string());
        // A changed address must be verified again.
        patch.email_verified = Some(false);
    }
    if body.contains_key("password") {
        let password = str_field(body, "password")?;
        if !is_strong_password(password) {
            return Err(ApiStatus::bad_request(PASSWORD_RULES));
        }
        patch.password_hash = Some(services.passwords.hash(password));
    }

    if patch.is_empty() {
        return Err(ApiStatus::bad_request("Nothing to update"));
    }
    services.users.update(&user.id, patch)?;
    Ok(HandlerResult::Status(ApiStatus::with_message(
        200,
        "User updated",
    )))
}

fn remove(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let user = authenticated(ctx)?;
    let body = ctx.require_body(&["password"])?;
    let password = str_field(body, "password")?;

    let services = &ctx.services;
    if !services.passwords.verify(&user.password_hash, password) {
        return Err(ApiStatus::unauthorized("Invalid password"));
    }
    services.users.delete(&user.id)?;
    Ok(HandlerResult::Status(ApiStatus::with_message(
        200,
        "User deleted",
    )))
}

/// `/api/user/verify` — confirm an address via mailed token, or re-send
/// the verification mail for the authenticated user.
pub fn verify(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let services = &ctx.services;

    if let Some(token) = ctx.query_get("token") {
        let claims = services.tokens.verify(token)?;
        let user = services
            .users
            .get(&claims.user_id)?
            .ok_or_else(|| ApiStatus::not_found("User not found"))?;
        services.users.update(
            &user.id,
            UserPatch {
                email_verified: Some(true),
                ..Default::default()
            },
        )?;
        services.tokens.revoke(token);
        return Ok(HandlerResult::Html(pages::info_page(
            "Email verified",
            &format!("Email \"{}\" successfully verified", user.email),
        )));
    }

    let user = authenticated(ctx)?;
    let token = services.tokens.issue(user.id, services.verification_ttl());
    services.mail.send_verification(&user.email, &token);
    Ok(HandlerResult::Status(ApiStatus::with_message(
        200,
        "Verification mail sent",
    )))
}

/// `/api/user/reset` — GET renders the form or mails a reset link;
/// POST applies the new password.
pub fn reset(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let services = &ctx.services;

    if ctx.method == HttpMethod::Post {
        let empty = Map::new();
        let body = ctx.body.as_ref().and_then(Value::as_object).unwrap_or(&empty);
        let password = body.get("password").and_then(Value::as_str);
        let confirm = body.get("password-confirm").and_then(Value::as_str);

        let (password, confirm) = match (password, confirm) {
            (Some(p), Some(c)) => (p, c),
            _ => {
                return Ok(HandlerResult::Html(pages::reset_form(Some(
                    "Password is missing",
                ))));
            }
        };
        if password != confirm {
            return Ok(HandlerResult::Html(pages::reset_form(Some(
                "Passwords are not the same",
            ))));
        }
        if !is_strong_password(password) {
            return Ok(HandlerResult::Html(pages::reset_form(Some(&format!(
                "Password too weak. {PASSWORD_RULES}"
            )))));
        }

        // The mailed token arrives as a query parameter; a logged-in
        // user may reset through the auth header instead.
        let token = match ctx.query_get("token") {
            Some(t) => t,
            None => ctx.auth_token()?,
        };
        let claims = services.tokens.verify(token)?;

        services.users.update(
            &claims.user_id,
            UserPatch {
                password_hash: Some(services.passwords.hash(password)),
                ..Default::default()
            },
        )?;
        services.tokens.revoke(token);
        return Ok(HandlerResult::Html(pages::info_page(
            "Password updated",
            "Password updated successfully",
        )));
    }

    let Some(email) = ctx.query_get("email") else {
        return Ok(HandlerResult::Html(pages::reset_form(None)));
    };
    let user = services
        .users
        .get_by_email(email)?
        .ok_or_else(|| ApiStatus::not_found(format!("Email '{email}' not found")))?;

    let token = services.tokens.issue(user.id, services.reset_ttl());
    services.mail.send_password_reset(email, &token);
    Err(ApiStatus::with_message(200, "Reset password email sent"))
}

/// `/api/user/token` — POST logs in with email and password; GET
/// refreshes a token nearing expiry.
pub fn token(ctx: &RequestContext<Services>) -> Result<HandlerResult, ApiStatus> {
    let services = &ctx.services;

    if ctx.method == HttpMethod::Post {
        let body = ctx.require_body(&["email", "password"])?;
        let email = str_field(body, "email")?;
        let password = str_field(body, "password")?;

        let user = services
            .users
            .get_by_email(email)?
            .ok_or_else(|| ApiStatus::not_found(format!("User with '{email}' doesn't exist")))?;
        if !services.passwords.verify(&user.password_hash, password) {
            return Err(ApiStatus::unauthorized("Invalid password"));
        }
        if !user.email_verified {
            let token = services.tokens.issue(user.id, services.verification_ttl());
            services.mail.send_verification(&user.email, &token);
        }

        let token = services.tokens.issue(user.id, services.token_ttl());
        let mut payload = Map::new();
        payload.insert("token".into(), json!(token));
        return Ok(HandlerResult::Object(payload));
    }

    let current = ctx.auth_token()?;
    let claims = services.tokens.verify(current)?;

    // Near expiry gets a fresh token; otherwise the same one comes back.
    let token = if services
        .tokens
        .expires_within(current, services.refresh_window())?
    {
        services.tokens.issue(claims.user_id, services.token_ttl())
    } else {
        current.to_string()
    };

    let mut payload = Map::new();
    payload.insert("token".into(), json!(token));
    Ok(HandlerResult::Object(payload))
}
