//! Passenger form validation with lagging and missing feedback

mod common;

use common::*;
use std::time::Duration;
use tokio::time::Instant;
use tripcheck_common::PassengerSection;
use tripcheck_e2e::pages::PassengerDetailsPage;
use tripcheck_e2e::E2eError;

const ADULT: &[PassengerSection] = &[PassengerSection::AdultMainBooker];

fn page(driver: &std::sync::Arc<FakeDriver>) -> PassengerDetailsPage {
    PassengerDetailsPage::new(context(driver.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_errors_on_first_click() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    errors_on_continue(&driver, ADULT, 1, Duration::ZERO);

    let report = page(&driver).validate_passenger_field_errors().await.unwrap();

    assert_eq!(report.trigger_attempts, 1);
    assert_eq!(report.sections, ADULT.to_vec());
    assert!(report.fields.iter().all(|f| f.attempts == 1 && f.errors == 1));
    assert_eq!(driver.clicks(PAX_CONTINUE), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lagging_errors_are_waited_for() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    errors_on_continue(&driver, ADULT, 1, Duration::from_secs(2));

    let report = page(&driver).validate_passenger_field_errors().await.unwrap();

    assert_eq!(report.trigger_attempts, 1);
    assert_eq!(driver.clicks(PAX_CONTINUE), 1);
}

#[tokio::test(start_paused = true)]
async fn test_errors_after_third_click() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    errors_on_continue(&driver, ADULT, 3, Duration::ZERO);

    let start = Instant::now();
    let report = page(&driver).validate_passenger_field_errors().await.unwrap();

    // Initial click plus two re-triggers, each after a 3 s poll
    assert_eq!(report.trigger_attempts, 3);
    assert_eq!(driver.clicks(PAX_CONTINUE), 3);
    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_no_feedback_after_cap() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);

    let err = page(&driver)
        .validate_passenger_field_errors()
        .await
        .unwrap_err();

    match err {
        E2eError::FeedbackNotTriggered {
            target, attempts, ..
        } => {
            assert_eq!(target, "passenger form validation");
            assert_eq!(attempts, 6);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(driver.clicks(PAX_CONTINUE), 6);
}

#[tokio::test(start_paused = true)]
async fn test_one_field_never_reports() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    errors_on_continue(&driver, ADULT, 1, Duration::ZERO);
    let email = PassengerDetailsPage::new(context(FakeDriver::new()))
        .error_messages_for_field("EMAILADDRESSADULT")
        .to_string();
    driver.on_click(PAX_CONTINUE, 1, vec![Effect::Remove(email)]);

    let err = page(&driver)
        .validate_passenger_field_errors()
        .await
        .unwrap_err();

    match err {
        E2eError::ValidationMissing {
            section,
            field,
            attempts,
            elapsed,
        } => {
            assert_eq!(section, "adult_mainBooker");
            assert_eq!(field, "EMAILADDRESSADULT");
            assert_eq!(attempts, 6);
            assert!(elapsed >= Duration::from_secs(6 * 15));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(driver.clicks(PAX_CONTINUE), 6);
}

#[tokio::test(start_paused = true)]
async fn test_child_and_infant_sections() {
    let driver = FakeDriver::new();
    passenger_form(&driver, true, true);
    let sections = [
        PassengerSection::AdultMainBooker,
        PassengerSection::InfantPassenger,
        PassengerSection::ChildPassenger,
    ];
    errors_on_continue(&driver, &sections, 1, Duration::ZERO);

    let pax = page(&driver);
    assert_eq!(pax.sections_to_validate().await, sections.to_vec());

    let report = pax.validate_passenger_field_errors().await.unwrap();
    assert_eq!(report.fields.len(), 12);
    assert!(report
        .fields
        .iter()
        .any(|f| f.section == PassengerSection::InfantPassenger && f.field == "SURNAMEINFANT"));
}

#[tokio::test(start_paused = true)]
async fn test_form_never_visible() {
    let driver = FakeDriver::new();
    driver.insert(PAX_CONTINUE, FakeNode::visible());

    let err = page(&driver)
        .validate_passenger_field_errors()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        E2eError::VisibilityTimeout { timeout, .. } if timeout == Duration::from_secs(40)
    ));
    assert_eq!(driver.clicks(PAX_CONTINUE), 0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_error_message_is_an_assertion_failure() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    errors_on_continue(&driver, ADULT, 1, Duration::ZERO);
    let first_name = PassengerDetailsPage::new(context(FakeDriver::new()))
        .error_messages_for_field("FIRSTNAMEADULT")
        .to_string();
    driver.on_click(
        PAX_CONTINUE,
        1,
        vec![Effect::Insert {
            key: first_name,
            node: FakeNode::visible().text("   "),
            delay: Duration::ZERO,
        }],
    );

    let err = page(&driver)
        .validate_passenger_field_errors()
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::AssertionFailed(ref msg) if msg.contains("FIRSTNAMEADULT")));
}

#[tokio::test(start_paused = true)]
async fn test_trigger_detection() {
    let driver = FakeDriver::new();
    passenger_form(&driver, false, false);
    let pax = page(&driver);

    assert!(!pax.wait_for_validation_triggered(Duration::from_secs(3)).await);
    assert!(!pax.has_error_for_field("FIRSTNAMEADULT").await.unwrap());

    errors_on_continue(&driver, ADULT, 1, Duration::ZERO);
    pax.click_continue().await.unwrap();

    assert!(pax.wait_for_validation_triggered(Duration::from_secs(3)).await);
    assert_eq!(pax.error_count_for_field("FIRSTNAMEADULT").await.unwrap(), 1);
}
