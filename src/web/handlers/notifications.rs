use std::str::Utf8Error;

use salvo::prelude::*;
use serde_json::json;

use super::render_error;
use crate::correlation::FinishOutcome;
use crate::web::web_state;

/// Decodes a notice body. Only a single trailing line ending is removed;
/// any other whitespace belongs to the token.
fn notice_text(body: &[u8]) -> Result<&str, Utf8Error> {
    let text = std::str::from_utf8(body)?;
    Ok(text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text))
}

/// Ingress for stores that report finished delayed writes over HTTP.
/// The body is the raw notice text, e.g. `finishedProcessing 1571158123`.
#[handler]
pub async fn finished_processing(req: &mut Request, res: &mut Response) {
    let body = match req.payload().await {
        Ok(bytes) => bytes,
        Err(err) => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("unreadable notice body: {}", err),
            );
            return;
        }
    };
    let message = match notice_text(body) {
        Ok(message) => message,
        Err(err) => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("notice body is not valid UTF-8: {}", err),
            );
            return;
        }
    };

    match web_state().devices.listener().handle(message) {
        Some(outcome) => {
            let evicted = match &outcome {
                FinishOutcome::RecordedEarly { evicted } => evicted.as_ref().map(|t| t.to_string()),
                _ => None,
            };
            res.status_code(StatusCode::ACCEPTED);
            res.render(Json(json!({
                "outcome": outcome.as_str(),
                "evicted": evicted,
            })));
        }
        None => render_error(res, StatusCode::BAD_REQUEST, "notice carries no delay token"),
    }
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use test_case::test_case;

    use super::*;
    use crate::correlation::{Claim, DelayToken};
    use crate::web::init_test_state;
    use crate::web::router::create_router;

    const URL: &str = "http://127.0.0.1:8484/notifications";

    async fn post(body: Vec<u8>) -> (Option<StatusCode>, Value) {
        init_test_state();
        let service = Service::new(create_router());
        let mut res = TestClient::post(URL).bytes(body).send(&service).await;
        let json = res.take_json::<Value>().await.expect("json body");
        (res.status_code, json)
    }

    #[test_case(b"finishedProcessing T1\n", "finishedProcessing T1" ; "line feed")]
    #[test_case(b"finishedProcessing T1\r\n", "finishedProcessing T1" ; "crlf")]
    #[test_case(b"finishedProcessing T1 \n", "finishedProcessing T1 " ; "inner trailing space kept")]
    #[test_case(b"finishedProcessing T1\n\n", "finishedProcessing T1\n" ; "only one line ending")]
    #[test_case(b" finishedProcessing T1", " finishedProcessing T1" ; "leading space kept")]
    fn notice_text_strips_one_line_ending(body: &[u8], expected: &str) {
        assert_eq!(notice_text(body).expect("utf-8"), expected);
    }

    #[test]
    fn notice_text_rejects_invalid_utf8() {
        assert!(notice_text(b"finishedProcessing T\xff1").is_err());
    }

    #[tokio::test]
    async fn notice_resolves_pending_writer() {
        let correlator = init_test_state().devices.correlator();
        let Claim::Pending(pending) = correlator
            .claim_or_register(DelayToken::from("http-resolve-1"))
            .expect("fresh token")
        else {
            panic!("no notice arrived yet");
        };

        let (status, body) = post(b"finishedProcessing http-resolve-1\n".to_vec()).await;

        assert_eq!(status, Some(StatusCode::ACCEPTED));
        assert_eq!(body["outcome"], "resolved");
        correlator.wait(pending).await.expect("writer resolved");
        assert!(!correlator.is_pending(&"http-resolve-1".into()));
    }

    #[tokio::test]
    async fn notice_without_writer_is_recorded_early() {
        let correlator = init_test_state().devices.correlator();

        let (status, body) = post(b"finishedProcessing http-early-1 \r\n".to_vec()).await;

        assert_eq!(status, Some(StatusCode::ACCEPTED));
        assert_eq!(body["outcome"], "recorded_early");
        assert!(correlator.is_early_finished(&"http-early-1 ".into()));
        assert!(!correlator.is_early_finished(&"http-early-1".into()));
        assert!(matches!(
            correlator.claim_or_register("http-early-1 ".into()),
            Ok(Claim::AlreadyFinished)
        ));
    }

    #[tokio::test]
    async fn non_utf8_notice_is_rejected() {
        let correlator = init_test_state().devices.correlator();

        let (status, _) = post(b"finishedProcessing http-bad-\xff".to_vec()).await;

        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert!(!correlator.is_early_finished(&"http-bad-\u{fffd}".into()));
    }

    #[tokio::test]
    async fn notice_without_token_is_rejected() {
        let (status, body) = post(b"finishedProcessing\n".to_vec()).await;

        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert!(body["error"].is_string());
    }
}
