use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::Request,
    response::Response,
};
use tower::util::ServiceExt;

use orgid_core::config::GoldStandardConfig;
use orgid_core::models::InstitutionRecord;
use orgid_core::{Gazetteer, GoldStandardSource, OrgId};

use crate::{WebState, app_router};

pub(super) const MIT: &str = "https://openalex.org/I63966007";
pub(super) const MANIPAL: &str = "https://openalex.org/I4210097890";
pub(super) const HARVARD: &str = "https://openalex.org/I136199984";

const GOLD_CSV: &str = "\
id,dataset,query,expected_ids
t1,affiliations,\"MIT, Cambridge\",https://openalex.org/I63966007
t2,affiliations,Harvard University,https://openalex.org/I136199984
t3,affiliations,,
t4,other,MIT,https://openalex.org/I4210097890
";

pub(super) struct TestHarness {
    _temp: tempfile::TempDir,
    pub(super) router: Router,
}

impl TestHarness {
    pub(super) fn setup() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let gold_path = temp.path().join("gold.csv");
        std::fs::write(&gold_path, GOLD_CSV).expect("seed gold standard");
        let source = GoldStandardSource::new(
            gold_path.to_str().expect("gold path"),
            &GoldStandardConfig::default(),
        )
        .expect("gold source");

        let orgid = orgid().with_gold_standard(source);
        let router = app_router(WebState::new(orgid));
        Self {
            _temp: temp,
            router,
        }
    }

    /// A server whose gold standard points at a file that does not exist.
    pub(super) fn with_missing_gold_standard() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing.csv");
        let source = GoldStandardSource::new(
            missing.to_str().expect("gold path"),
            &GoldStandardConfig::default(),
        )
        .expect("gold source");
        let router = app_router(WebState::new(orgid().with_gold_standard(source)));
        Self {
            _temp: temp,
            router,
        }
    }

    pub(super) async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    pub(super) async fn get(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("get request"),
        )
        .await
    }
}

fn orgid() -> OrgId {
    let records = vec![
        InstitutionRecord::new(MIT, "https://ror.org/042nb2s44", "Massachusetts Institute of Technology")
            .with_alternate_names(["MIT"])
            .with_location(Some("Cambridge"), Some("Massachusetts"), Some("United States")),
        InstitutionRecord::new(MANIPAL, "https://ror.org/02xfp8v59", "Manipal Institute of Technology")
            .with_alternate_names(["MIT"])
            .with_location(Some("Manipal"), Some("Karnataka"), Some("India")),
        InstitutionRecord::new(HARVARD, "https://ror.org/03vek6s52", "Harvard University")
            .with_location(Some("Cambridge"), Some("Massachusetts"), Some("United States")),
    ];
    let gazetteer = Gazetteer::from_institutions(&records);
    OrgId::from_records(records, Arc::new(gazetteer)).expect("boot orgid")
}

pub(super) async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body bytes");
    serde_json::from_slice(&bytes).expect("decode json")
}

pub(super) fn header_value<'a>(headers: &'a axum::http::HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "tests usually pass temporary `json!` values directly"
)]
pub(super) fn json_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&body).expect("json request body"),
        ))
        .expect("json request")
}

pub(super) fn empty_post(path: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .body(Body::empty())
        .expect("empty post request")
}
