mod common;

use axum::http::StatusCode;
use common::{call, database, token};
use axum::Router;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_package(
    pool: &PgPool,
    audience: &str,
    contacts: Option<i32>,
    applications: Option<i32>,
    jobs: Option<i32>,
) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO packages (name, audience, contacts_limit, applications_limit, jobs_limit, price, duration_days)
        VALUES ($1, $2, $3, $4, $5, 0, 30)
        RETURNING id
        "#,
    )
    .bind(format!("test-{}", Uuid::new_v4()))
    .bind(audience)
    .bind(contacts)
    .bind(applications)
    .bind(jobs)
    .fetch_one(pool)
    .await
    .expect("seed package")
}

async fn sync_users(app: &Router, tokens: &[&str]) {
    for t in tokens {
        let (status, _) = call(app, "PUT", "/api/me", Some(*t), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }
}

async fn subscribe(app: &Router, user_id: Uuid, package_id: Uuid) {
    let admin = token(Uuid::new_v4(), "admin");
    let (status, _) = call(
        app,
        "POST",
        "/api/admin/subscriptions",
        Some(&admin),
        Some(json!({ "user_id": user_id, "package_id": package_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn publish_job(app: &Router, employer: &str, body: JsonValue) -> JsonValue {
    let (status, job) = call(app, "POST", "/api/jobs", Some(employer), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    job
}

/// Timestamps go into query strings; `+` would decode as a space.
fn query_instant(value: &JsonValue) -> String {
    value.as_str().unwrap().replace('+', "%2B")
}

#[tokio::test]
async fn alert_application_and_messaging_flow() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool.clone()));

    let employer_id = Uuid::new_v4();
    let candidate_id = Uuid::new_v4();
    let employer = token(employer_id, "employer");
    let candidate = token(candidate_id, "candidate");
    let admin = token(Uuid::new_v4(), "admin");
    let sector = format!("Sector-{}", Uuid::new_v4());

    for t in [&employer, &candidate] {
        let (status, _) = call(&app, "PUT", "/api/me", Some(t), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let employer_package = seed_package(&pool, "employer", Some(1), None, Some(2)).await;
    let candidate_package = seed_package(&pool, "candidate", Some(0), Some(1), Some(0)).await;
    for (user_id, package_id) in [(employer_id, employer_package), (candidate_id, candidate_package)] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/subscriptions",
            Some(&admin),
            Some(json!({ "user_id": user_id, "package_id": package_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Candidate saves a job alert before any job exists.
    let (status, alert) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&candidate),
        Some(json!({
            "title": "Well-paid tech",
            "criteria": { "sectors": [sector.clone()], "salary_min": 80000 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(alert["kind"], "job");
    let alert_id = alert["id"].as_str().unwrap().to_string();

    let (status, job) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&employer),
        Some(json!({
            "title": "Backend Engineer",
            "company": "Acme",
            "sector": sector.clone(),
            "salary_min": 90000,
            "salary_max": 120000,
            "publish": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = job["id"].as_str().unwrap().to_string();

    // Publishing matched the alert and reached the candidate's inbox.
    let (status, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&candidate), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["new_alert_matches"], 1);
    assert!(inbox["unread_notifications"].as_i64().unwrap() >= 1);
    assert_eq!(inbox["chat_poll_interval_secs"], 4);

    let (status, matches) = call(
        &app,
        "GET",
        &format!("/api/alerts/{}/matches", alert_id),
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches["total"], 1);
    assert_eq!(matches["items"][0]["id"], job_id.as_str());

    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&candidate), None).await;
    assert_eq!(inbox["new_alert_matches"], 0);

    // Pausing keeps everything but the flag.
    let (status, paused) = call(
        &app,
        "POST",
        &format!("/api/alerts/{}/pause", alert_id),
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["state"], "paused");
    assert_eq!(paused["criteria"], alert["criteria"]);
    assert_eq!(paused["updated_at"], alert["updated_at"]);

    // Applying spends the only application; a second job is refused.
    let (status, application) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&candidate),
        Some(json!({ "job_id": job_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&candidate),
        Some(json!({ "job_id": job_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, second_job) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&employer),
        Some(json!({ "title": "Data Engineer", "company": "Acme", "publish": true })),
    )
    .await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&candidate),
        Some(json!({ "job_id": second_job["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("limit reached"));

    // Job posting limit of two is now used up.
    let (status, _) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&employer),
        Some(json!({ "title": "Third", "company": "Acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    // Accept once; the second accept conflicts.
    let status_uri = format!("/api/applications/{}/status", application_id);
    let (status, accepted) = call(
        &app,
        "PATCH",
        &status_uri,
        Some(&employer),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");
    let (status, body) = call(
        &app,
        "PATCH",
        &status_uri,
        Some(&employer),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Application is already accepted");

    // Employer opens a conversation (one contact), candidate replies for free.
    let (status, started) = call(
        &app,
        "POST",
        "/api/conversations",
        Some(&employer),
        Some(json!({ "recipient_id": candidate_id, "body": "Welcome aboard" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation_id = started["conversation"]["id"].as_str().unwrap().to_string();
    let messages_uri = format!("/api/conversations/{}/messages", conversation_id);

    let (status, _) = call(
        &app,
        "POST",
        &messages_uri,
        Some(&candidate),
        Some(json!({ "body": "Thanks!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&employer), None).await;
    assert_eq!(inbox["unread_messages"], 1);

    let (status, messages) = call(&app, "GET", &messages_uri, Some(&employer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages["items"].as_array().unwrap().len(), 2);
    assert_eq!(messages["items"][0]["body"], "Welcome aboard");

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/conversations/{}/read", conversation_id),
        Some(&employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&employer), None).await;
    assert_eq!(inbox["unread_messages"], 0);

    // Writing again in the same conversation does not spend another contact.
    let (status, _) = call(
        &app,
        "POST",
        "/api/conversations",
        Some(&employer),
        Some(json!({ "recipient_id": candidate_id, "body": "See you Monday" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, usage) = call(
        &app,
        "GET",
        "/api/usage/check?action=contact",
        Some(&employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["allowed"], false);
    assert_eq!(usage["used"], 1);

    // Outsiders cannot read the conversation.
    let outsider = token(Uuid::new_v4(), "candidate");
    let (status, _) = call(&app, "GET", &messages_uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn candidates_need_an_application_before_messaging_employers() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool));

    let employer_id = Uuid::new_v4();
    let candidate_id = Uuid::new_v4();
    let employer = token(employer_id, "employer");
    let candidate = token(candidate_id, "candidate");
    for t in [&employer, &candidate] {
        let (status, _) = call(&app, "PUT", "/api/me", Some(t), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = call(
        &app,
        "POST",
        "/api/conversations",
        Some(&candidate),
        Some(json!({ "recipient_id": employer_id, "body": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Without a subscription the employer is refused by the gate.
    let (status, body) = call(
        &app,
        "POST",
        "/api/conversations",
        Some(&employer),
        Some(json!({ "recipient_id": candidate_id, "body": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("No active subscription"));
}

#[tokio::test]
async fn invited_candidates_apply_without_spending_applications() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool.clone()));

    let employer_id = Uuid::new_v4();
    let candidate_id = Uuid::new_v4();
    let employer = token(employer_id, "employer");
    let candidate = token(candidate_id, "candidate");
    sync_users(&app, &[employer.as_str(), candidate.as_str()]).await;
    subscribe(&app, employer_id, seed_package(&pool, "employer", Some(1), None, Some(2)).await).await;
    subscribe(&app, candidate_id, seed_package(&pool, "candidate", Some(0), Some(0), Some(0)).await).await;

    let (status, _) = call(
        &app,
        "PUT",
        "/api/candidates/me",
        Some(&candidate),
        Some(json!({ "headline": "Rust developer", "skills": ["rust"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let invited_job = publish_job(
        &app,
        &employer,
        json!({ "title": "Platform Engineer", "company": "Acme", "publish": true }),
    )
    .await;
    let other_job = publish_job(
        &app,
        &employer,
        json!({ "title": "SRE", "company": "Acme", "publish": true }),
    )
    .await;

    let (status, invitation) = call(
        &app,
        "POST",
        "/api/invitations",
        Some(&employer),
        Some(json!({ "job_id": invited_job["id"], "candidate_id": candidate_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invitation["status"], "pending");

    // applications_limit is zero, but the invitation covers this one.
    let (status, application) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&candidate),
        Some(json!({ "job_id": invited_job["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["invitation_id"], invitation["id"]);

    let (status, _) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&candidate),
        Some(json!({ "job_id": other_job["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    // Applying accepted the invitation, so it cannot be answered again.
    let respond_uri = format!("/api/invitations/{}/respond", invitation["id"].as_str().unwrap());
    let (status, body) = call(
        &app,
        "POST",
        &respond_uri,
        Some(&candidate),
        Some(json!({ "accept": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Invitation has already been answered");

    let (_, usage) = call(
        &app,
        "GET",
        "/api/usage/check?action=application",
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(usage["used"], 0);
}

#[tokio::test]
async fn paused_alerts_miss_new_jobs_and_since_narrows_matches() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool.clone()));

    let employer_id = Uuid::new_v4();
    let employer = token(employer_id, "employer");
    let candidate = token(Uuid::new_v4(), "candidate");
    sync_users(&app, &[employer.as_str(), candidate.as_str()]).await;
    subscribe(&app, employer_id, seed_package(&pool, "employer", None, None, Some(3)).await).await;
    let sector = format!("Sector-{}", Uuid::new_v4());

    let (status, alert) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&candidate),
        Some(json!({ "title": "Sector watch", "criteria": { "sectors": [sector.clone()] } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let alert_uri = format!("/api/alerts/{}", alert["id"].as_str().unwrap());

    let (status, _) = call(&app, "POST", &format!("{}/pause", alert_uri), Some(&candidate), None).await;
    assert_eq!(status, StatusCode::OK);
    let first = publish_job(
        &app,
        &employer,
        json!({ "title": "Analyst", "company": "Acme", "sector": sector.clone(), "publish": true }),
    )
    .await;
    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&candidate), None).await;
    assert_eq!(inbox["new_alert_matches"], 0);

    let (status, resumed) = call(&app, "POST", &format!("{}/resume", alert_uri), Some(&candidate), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["state"], "active");
    let second = publish_job(
        &app,
        &employer,
        json!({ "title": "Senior Analyst", "company": "Acme", "sector": sector.clone(), "publish": true }),
    )
    .await;
    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&candidate), None).await;
    assert_eq!(inbox["new_alert_matches"], 1);

    let (status, recent) = call(
        &app,
        "GET",
        &format!("{}/matches?since={}", alert_uri, query_instant(&first["published_at"])),
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent["total"], 1);
    assert_eq!(recent["items"][0]["id"], second["id"]);

    let (_, all) = call(&app, "GET", &format!("{}/matches", alert_uri), Some(&candidate), None).await;
    assert_eq!(all["total"], 2);
    assert_eq!(all["items"][0]["id"], second["id"]);
}

#[tokio::test]
async fn visible_profiles_reach_employer_alerts_once() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool));

    let candidate_id = Uuid::new_v4();
    let employer = token(Uuid::new_v4(), "employer");
    let candidate = token(candidate_id, "candidate");
    sync_users(&app, &[employer.as_str(), candidate.as_str()]).await;
    let skill = format!("skill-{}", Uuid::new_v4());

    let (status, alert) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&employer),
        Some(json!({ "title": "Niche skill", "criteria": { "skills": [skill.clone()] } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(alert["kind"], "candidate");

    let profile = json!({ "headline": "Specialist", "skills": [skill.clone()] });
    let (status, _) = call(&app, "PUT", "/api/candidates/me", Some(&candidate), Some(profile.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&employer), None).await;
    assert_eq!(inbox["new_alert_matches"], 1);

    let (status, matches) = call(
        &app,
        "GET",
        &format!("/api/alerts/{}/matches", alert["id"].as_str().unwrap()),
        Some(&employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches["total"], 1);
    assert_eq!(matches["items"][0]["user_id"], candidate_id.to_string());

    // A second save of the same profile is not a new match.
    let (status, _) = call(&app, "PUT", "/api/candidates/me", Some(&candidate), Some(profile)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, inbox) = call(&app, "GET", "/api/inbox/poll", Some(&employer), None).await;
    assert_eq!(inbox["new_alert_matches"], 0);
}

#[tokio::test]
async fn message_cursor_pages_forward_without_gaps() {
    let Some(pool) = database().await else {
        return;
    };
    let app = talent_marketplace::routes::app(talent_marketplace::AppState::new(pool.clone()));

    let employer_id = Uuid::new_v4();
    let candidate_id = Uuid::new_v4();
    let employer = token(employer_id, "employer");
    let candidate = token(candidate_id, "candidate");
    sync_users(&app, &[employer.as_str(), candidate.as_str()]).await;
    subscribe(&app, employer_id, seed_package(&pool, "employer", Some(1), None, Some(0)).await).await;

    let (status, started) = call(
        &app,
        "POST",
        "/api/conversations",
        Some(&employer),
        Some(json!({ "recipient_id": candidate_id, "body": "m0" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cursor = query_instant(&started["message"]["created_at"]);
    let messages_uri = format!(
        "/api/conversations/{}/messages",
        started["conversation"]["id"].as_str().unwrap()
    );
    for body in ["m1", "m2", "m3"] {
        let (status, _) = call(&app, "POST", &messages_uri, Some(&employer), Some(json!({ "body": body }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let bodies = |page: &JsonValue| -> Vec<String> {
        page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["body"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, page) = call(
        &app,
        "GET",
        &format!("{}?after={}&limit=2", messages_uri, cursor),
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(bodies(&page), ["m1", "m2"]);

    let next_cursor = query_instant(&page["items"][1]["created_at"]);
    let (_, page) = call(
        &app,
        "GET",
        &format!("{}?after={}&limit=2", messages_uri, next_cursor),
        Some(&candidate),
        None,
    )
    .await;
    assert_eq!(bodies(&page), ["m3"]);

    // Without a cursor the latest messages come back, oldest first.
    let (_, page) = call(&app, "GET", &format!("{}?limit=2", messages_uri), Some(&candidate), None).await;
    assert_eq!(bodies(&page), ["m2", "m3"]);
}
