use culture_lens::consolidation::{consolidate_responses, dominant_quadrant};
use culture_lens::identity::{Identity, ProfileDetails, Role};
use culture_lens::questionnaire::{CVCQ_QUESTIONS, CVF_QUESTIONS};
use culture_lens::store::{ResponseStore, SqliteStore};
use culture_lens::{
    decode_transfer_code, encode_transfer_code, score_cvf, CvfAllocation, Event, FlowError,
    Quadrant, Response, Screen, ScoreSet, Session, UserId, ValidationError,
};
use tempfile::tempdir;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() <= 0.01, "{a} != {b}");
}

fn respondent(id: &str, name: &str) -> Identity {
    Identity::new(id, format!("{id}@example.com"), Role::User)
        .with_profile(&ProfileDetails::new(name, "Coordenador"))
}

fn admin() -> Identity {
    Identity::new("admin", "admin@example.com", Role::Admin)
        .with_profile(&ProfileDetails::new("Admin", "RH"))
}

fn stored(id: &str, cvf: ScoreSet) -> Response {
    Response {
        user_id: UserId::new(id),
        username: format!("{id}@example.com"),
        full_name: id.to_uppercase(),
        position: "Analista".to_string(),
        cvf_scores: cvf,
        cvcq_scores: ScoreSet::uniform(4.0),
        submitted_at: None,
    }
}

/// Walk one respondent through both questionnaires.
fn complete(identity: Identity, cvf: &[CvfAllocation], cvcq: &[Option<u8>]) -> Response {
    let mut session = Session::new();
    assert_eq!(
        session.apply(Event::Authenticated(identity)).unwrap(),
        Screen::Intro
    );
    session.apply(Event::Start).unwrap();
    session.submit_culture(cvf).unwrap();
    assert_eq!(session.submit_leadership(cvcq).unwrap(), Screen::Completion);
    session.completed_response().unwrap()
}

#[test]
fn eleven_even_splits_score_25_each() {
    let scores = score_cvf(&vec![CvfAllocation::even(); 11]).unwrap();
    assert_eq!(scores, ScoreSet::uniform(25.0));
}

#[test]
fn all_fours_score_exactly_four() {
    let response = complete(
        respondent("ana", "Ana"),
        &vec![CvfAllocation::even(); CVF_QUESTIONS.len()],
        &vec![Some(4); CVCQ_QUESTIONS.len()],
    );
    assert_eq!(response.cvcq_scores, ScoreSet::uniform(4.0));
    assert_eq!(response.cvf_scores, ScoreSet::uniform(25.0));
    assert!(response.submitted_at.is_some());
}

#[test]
fn three_single_quadrant_profiles_consolidate_to_thirds() {
    let responses = vec![
        stored("a", ScoreSet::new(100.0, 0.0, 0.0, 0.0)),
        stored("b", ScoreSet::new(0.0, 100.0, 0.0, 0.0)),
        stored("c", ScoreSet::new(0.0, 0.0, 100.0, 0.0)),
    ];
    let consolidated = consolidate_responses(&responses);
    let scores = consolidated.scores.unwrap();
    assert_close(scores.get(Quadrant::Collaborate), 33.33);
    assert_close(scores.get(Quadrant::Create), 33.33);
    assert_close(scores.get(Quadrant::Compete), 33.33);
    assert_eq!(scores.get(Quadrant::Control), 0.0);
    assert_eq!(consolidated.respondents, 3);
    // Three-way tie resolves to the first quadrant in canonical order.
    assert_eq!(dominant_quadrant(&scores), Quadrant::Collaborate);
}

#[test]
fn unanswered_leadership_question_blocks_completion() {
    let mut session = Session::new();
    session
        .apply(Event::Authenticated(respondent("ana", "Ana")))
        .unwrap();
    session.apply(Event::Start).unwrap();
    session
        .submit_culture(&vec![CvfAllocation::even(); CVF_QUESTIONS.len()])
        .unwrap();

    let mut answers = vec![Some(5); CVCQ_QUESTIONS.len()];
    answers[7] = None;
    let err = session.submit_leadership(&answers).unwrap_err();
    assert!(matches!(
        err,
        FlowError::Validation(ValidationError::Incomplete { answered: 11, .. })
    ));
    assert_eq!(session.screen(), Screen::LeadershipQuestionnaire);
    assert!(session.completed_response().is_none());
}

#[tokio::test]
async fn transfer_code_moves_a_response_into_the_admin_view() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("survey.sqlite")).unwrap();

    let mut cvf = vec![CvfAllocation::even(); CVF_QUESTIONS.len()];
    cvf[0] = CvfAllocation::new(70, 10, 10, 10);
    let response = complete(
        respondent("ana", "Ana Souza"),
        &cvf,
        &vec![Some(6); CVCQ_QUESTIONS.len()],
    );
    let code = encode_transfer_code(&response).unwrap();

    // Pasted with a trailing newline.
    let imported = decode_transfer_code(&format!("{code}\n")).unwrap();
    assert_eq!(imported, response);
    store.upsert_response(&imported).await.unwrap();

    let mut session = Session::new();
    assert_eq!(
        session.apply(Event::Authenticated(admin())).unwrap(),
        Screen::AdminReviewing
    );
    session
        .apply(Event::ResponsesChanged(store.list_responses().await.unwrap()))
        .unwrap();
    assert_eq!(session.consolidated().respondents, 1);
    assert_eq!(
        dominant_quadrant(&session.consolidated().scores.unwrap()),
        Quadrant::Collaborate
    );

    assert_eq!(
        session
            .apply(Event::SelectResponse(imported.clone()))
            .unwrap(),
        Screen::AdminViewingReport
    );

    // Deleting the open response returns the admin to the list.
    store.delete_response(&imported.user_id).await.unwrap();
    let screen = session
        .apply(Event::ResponsesChanged(store.list_responses().await.unwrap()))
        .unwrap();
    assert_eq!(screen, Screen::AdminReviewing);
    assert!(session.consolidated().is_absent());
    assert!(session.selected().is_none());
}

#[tokio::test]
async fn corrupted_code_leaves_the_store_untouched() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("survey.sqlite")).unwrap();
    let existing = stored("a", ScoreSet::uniform(25.0));
    store.upsert_response(&existing).await.unwrap();

    let code = encode_transfer_code(&stored("b", ScoreSet::uniform(25.0))).unwrap();
    let truncated = &code[..code.len() / 2];
    for bad in [truncated, "not a code!", ""] {
        let err = decode_transfer_code(bad).unwrap_err();
        assert!(matches!(err, ValidationError::TransferCode(_)), "{bad}: {err}");
    }

    assert_eq!(store.list_responses().await.unwrap(), vec![existing]);
}

#[test]
fn admin_cannot_open_a_response_before_any_data() {
    let mut session = Session::new();
    session.apply(Event::Authenticated(admin())).unwrap();
    session.apply(Event::ResponsesChanged(Vec::new())).unwrap();

    let err = session
        .apply(Event::SelectResponse(stored("a", ScoreSet::uniform(25.0))))
        .unwrap_err();
    assert!(matches!(err, FlowError::NoConsolidatedData));
    assert_eq!(session.screen(), Screen::AdminReviewing);
}

#[test]
fn logout_clears_progress_from_any_screen() {
    let mut session = Session::new();
    session
        .apply(Event::Authenticated(respondent("ana", "Ana")))
        .unwrap();
    session.apply(Event::Start).unwrap();
    session
        .submit_culture(&vec![CvfAllocation::even(); CVF_QUESTIONS.len()])
        .unwrap();

    assert_eq!(session.apply(Event::Logout).unwrap(), Screen::Unauthenticated);
    assert!(session.identity().is_none());
    assert!(session.cvf_scores().is_none());
}
