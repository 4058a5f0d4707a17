//! Property-based tests for the conversation flows
//!
//! Whole turns go through the router, so these check what users actually
//! observe: where a session can end up and how it gets back to idle.

use super::replies;
use super::state::{callback_key, SessionState, Status};
use super::vocabulary;
use crate::db::{Database, UserId};
use crate::runtime::testing::{registered_router, test_router};
use crate::runtime::Router;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn session(router: &Router<Database>, user: &UserId) -> SessionState {
    router.store().load_session(user).unwrap()
}

/// Callback entries each state depends on
fn is_consistent(session: &SessionState) -> bool {
    match session.status {
        Status::RegGroup => session
            .callback_value(callback_key::COURSE_NAME)
            .is_some_and(vocabulary::is_course),
        Status::Func => session
            .callback_value(callback_key::VAR_NUM)
            .is_some_and(|n| n == "1" || n == "2"),
        Status::CustomAnswer => session.callback_value(callback_key::QUESTION).is_some(),
        _ => true,
    }
}

/// Inputs that finish whatever flow the session is in
fn completion(session: &SessionState) -> Vec<String> {
    let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
    match session.status {
        Status::Any => vec![],
        Status::RegCourse => owned(&["1 курс", "б03-0101"]),
        Status::RegGroup => session
            .callback_value(callback_key::COURSE_NAME)
            .and_then(|course| vocabulary::groups(course).into_iter().next())
            .into_iter()
            .collect(),
        Status::Link => owned(&["матанализ"]),
        Status::Schedule => owned(&["понедельник"]),
        Status::Query | Status::Func => owned(&["x^2"]),
        Status::VarNum => owned(&["1 переменная", "x^2"]),
        Status::CustomToAnswer => owned(&["плохослово"]),
        Status::CustomAnswer => owned(&["ответ"]),
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_vocabulary() -> impl Strategy<Value = String> {
    let mut words: Vec<String> = vocabulary::MAIN_MENU_LABELS
        .iter()
        .chain(vocabulary::OTHER_MENU_LABELS.iter())
        .chain(vocabulary::COURSES.iter())
        .chain(vocabulary::DAYS.iter())
        .map(|s| (*s).to_string())
        .collect();
    words.extend(vocabulary::VAR_COUNTS.iter().map(|(l, _)| (*l).to_string()));
    words.extend(vocabulary::groups("2 курс"));
    words.push("матанализ".into());
    proptest::sample::select(words)
}

fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => arb_vocabulary(),
        1 => "[a-zа-я0-9 ]{1,16}",
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every reachable session carries the callback its state reads
    #[test]
    fn prop_sessions_stay_consistent(inputs in proptest::collection::vec(arb_input(), 0..12)) {
        let user = UserId::from("7");
        let router = registered_router("7");
        block_on(async {
            for text in &inputs {
                router.get_answer(&user, text).await.unwrap();
                let current = session(&router, &user);
                prop_assert!(is_consistent(&current), "after {:?}: {:?}", text, current);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    // From anywhere, the flow's own completion inputs lead back to idle
    // in at most two turns
    #[test]
    fn prop_completion_returns_to_idle(inputs in proptest::collection::vec(arb_input(), 0..12)) {
        let user = UserId::from("7");
        let router = registered_router("7");
        block_on(async {
            for text in &inputs {
                router.get_answer(&user, text).await.unwrap();
            }

            let stuck = session(&router, &user);
            let steps = completion(&stuck);
            prop_assert!(steps.len() <= 2);
            for text in &steps {
                let reply = router.get_answer(&user, text).await.unwrap();
                prop_assert!(reply.is_some(), "no reply to {:?} from {:?}", text, stuck);
            }
            prop_assert_eq!(session(&router, &user), SessionState::idle());
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Whatever an unregistered user says first, they are asked for a course
    #[test]
    fn prop_unregistered_first_message_asks_course(text in arb_input()) {
        let user = UserId::from("7");
        let router = test_router();
        block_on(async {
            let reply = router.get_answer(&user, &text).await.unwrap();
            let reply_text = reply.and_then(|r| r.text);
            prop_assert_eq!(reply_text.as_deref(), Some(replies::CHOOSE_COURSE_GREETING));
            prop_assert_eq!(session(&router, &user).status, Status::RegCourse);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Text no handler claims leaves an idle session untouched
    #[test]
    fn prop_unclaimed_text_is_silent(text in "[a-z]{12,16}") {
        let user = UserId::from("7");
        let router = registered_router("7");
        block_on(async {
            prop_assert_eq!(router.get_answer(&user, &text).await.unwrap(), None);
            prop_assert_eq!(session(&router, &user), SessionState::idle());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
