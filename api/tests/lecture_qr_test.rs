mod helpers;

use axum::http::StatusCode;
use db::models::lecture::Model as LectureModel;
use db::models::student::Model as StudentModel;
use serde_json::json;

use helpers::app::{campus_closed, get_json, make_test_app, make_test_app_with, post_json};

#[tokio::test]
async fn polling_rotates_the_secret_and_invalidates_the_old_one() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();

    let lecture = LectureModel::create(db, 7, "Databases L9").await.unwrap();
    StudentModel::create(db, 100, "Asha Rao").await.unwrap();
    let uri = format!("/api/lectures/{}/qr", lecture.id);

    let (status, first) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["payload"]["kind"], "lecture");
    assert_eq!(first["data"]["display_code"].as_str().unwrap().len(), 6);
    let first_secret = first["data"]["payload"]["secret"].as_str().unwrap().to_owned();

    let (status, second) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let second_secret = second["data"]["payload"]["secret"].as_str().unwrap().to_owned();
    assert_ne!(first_secret, second_secret);

    // The rotated-out secret is dead even though its TTL has not elapsed.
    let stale = json!({
        "claim": {
            "kind": "lecture",
            "lecture_id": lecture.id,
            "student_id": 100,
            "secret": first_secret,
        }
    });
    let (status, response) = post_json(&app, "/api/attendance/scan", stale).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["message"].as_str().unwrap().contains("Invalid"));

    // The current secret marks the student present.
    let fresh = json!({
        "claim": {
            "kind": "lecture",
            "lecture_id": lecture.id,
            "student_id": 100,
            "secret": second_secret,
        }
    });
    let (status, response) = post_json(&app, "/api/attendance/scan", fresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["status"], "present");
}

#[tokio::test]
async fn no_open_slot_means_no_lecture_code() {
    let (app, app_state) = make_test_app_with(campus_closed()).await;
    let lecture = LectureModel::create(app_state.db(), 7, "Databases L9")
        .await
        .unwrap();

    let (status, response) = get_json(&app, &format!("/api/lectures/{}/qr", lecture.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["message"].as_str().unwrap().contains("slot"));
}

#[tokio::test]
async fn unknown_lecture_is_404() {
    let (app, _state) = make_test_app().await;
    let (status, _) = get_json(&app, "/api/lectures/999/qr").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
