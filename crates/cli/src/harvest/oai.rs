//! OAI-PMH `ListRecords` harvest with `metadataPrefix=dim`.

use tracing::info;

use scholarlink_io::oai::parse_page;
use scholarlink_recon::HarvestedRecord;

use super::common::{FetchClient, FetchSession};
use crate::exit_codes::{EXIT_FETCH_PROTOCOL, EXIT_PARSE};
use crate::CliError;

pub const METADATA_PREFIX: &str = "dim";

/// OAI error code that means "empty result", not failure.
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

#[derive(Debug, Default)]
pub struct RecordHarvest {
    pub records: Vec<HarvestedRecord>,
    /// Raw `<record>` fragments for the local snapshot.
    pub fragments: Vec<String>,
    pub session: FetchSession,
}

/// Fetch every page, following `resumptionToken` until it is absent or empty.
pub fn harvest_records(client: &FetchClient, endpoint: &str) -> Result<RecordHarvest, CliError> {
    let mut harvest = RecordHarvest::default();
    let mut token: Option<String> = None;

    loop {
        let body = client.get_text(&mut harvest.session, |http| {
            let req = http.get(endpoint);
            match token.as_deref() {
                None => req.query(&[("verb", "ListRecords"), ("metadataPrefix", METADATA_PREFIX)]),
                Some(t) => req.query(&[("verb", "ListRecords"), ("resumptionToken", t)]),
            }
        })?;

        let page = parse_page(&body).map_err(|e| CliError {
            code: EXIT_PARSE,
            message: format!("OAI page {} from {endpoint}: {e}", harvest.session.pages + 1),
            hint: None,
        })?;

        if let Some(err) = page.error {
            if err.code == NO_RECORDS_MATCH {
                info!(endpoint, "repository has no matching records");
                break;
            }
            return Err(CliError {
                code: EXIT_FETCH_PROTOCOL,
                message: format!("OAI-PMH error {}: {}", err.code, err.message),
                hint: (err.code == "badResumptionToken")
                    .then(|| "the harvest expired mid-way; rerun with --refresh".to_string()),
            });
        }

        harvest.session.pages += 1;
        harvest.session.records += page.records.len();
        info!(
            page = harvest.session.pages,
            records = harvest.session.records,
            "harvested OAI page"
        );
        harvest.records.extend(page.records);
        harvest.fragments.extend(page.fragments);

        match page.resumption_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    info!(
        pages = harvest.session.pages,
        records = harvest.session.records,
        requests = harvest.session.requests,
        recoveries = harvest.session.recoveries,
        bytes = harvest.session.raw_bytes,
        "record harvest complete"
    );
    Ok(harvest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::exit_codes::EXIT_FETCH_UPSTREAM;
    use httpmock::prelude::*;

    fn client() -> FetchClient {
        let config = HarvestConfig {
            backoff_secs: 0,
            ..HarvestConfig::default()
        };
        FetchClient::new("OAI-PMH", &config).unwrap()
    }

    fn page(ids: &[&str], token: Option<&str>) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?><OAI-PMH><ListRecords>");
        for id in ids {
            xml.push_str(&format!(
                "<record><header><identifier>{id}</identifier><setSpec>col_1</setSpec></header>\
                 <metadata><dim:dim xmlns:dim=\"http://www.dspace.org/xmlns/dspace/dim\">\
                 <dim:field element=\"contributor\" qualifier=\"advisor\">Lee, Ann</dim:field>\
                 </dim:dim></metadata></record>"
            ));
        }
        if let Some(t) = token {
            xml.push_str(&format!("<resumptionToken cursor=\"0\">{t}</resumptionToken>"));
        }
        xml.push_str("</ListRecords></OAI-PMH>");
        xml
    }

    #[test]
    fn follows_resumption_tokens() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/oai")
                .query_param("verb", "ListRecords")
                .query_param("metadataPrefix", "dim");
            then.status(200).body(page(&["oai:1", "oai:2"], Some("tok/2")));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/oai")
                .query_param("verb", "ListRecords")
                .query_param("resumptionToken", "tok/2");
            then.status(200).body(page(&["oai:3"], None));
        });

        let harvest = harvest_records(&client(), &server.url("/oai")).unwrap();
        first.assert();
        second.assert();

        let ids: Vec<&str> = harvest.records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["oai:1", "oai:2", "oai:3"]);
        assert_eq!(harvest.fragments.len(), 3);
        assert_eq!(harvest.session.pages, 2);
        assert_eq!(harvest.session.records, 3);
        assert_eq!(harvest.session.requests, 2);
        assert!(harvest.session.raw_bytes > 0);
    }

    #[test]
    fn failing_second_page_exhausts_retry_budget() {
        let server = MockServer::start();
        let flaky = server.mock(|when, then| {
            when.method(GET).path("/oai").query_param("resumptionToken", "t1");
            then.status(502);
        });
        server.mock(|when, then| {
            when.method(GET).path("/oai").query_param("metadataPrefix", "dim");
            then.status(200).body(page(&["oai:1"], Some("t1")));
        });

        // Every retry of page 2 fails: budget of 3 is spent, then the harvest stops.
        let err = harvest_records(&client(), &server.url("/oai")).unwrap_err();
        assert_eq!(err.code, EXIT_FETCH_UPSTREAM);
        flaky.assert_hits(4);
    }

    #[test]
    fn protocol_error_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/oai");
            then.status(200).body(
                "<OAI-PMH><error code=\"cannotDisseminateFormat\">dim not supported</error></OAI-PMH>",
            );
        });

        let err = harvest_records(&client(), &server.url("/oai")).unwrap_err();
        assert_eq!(err.code, EXIT_FETCH_PROTOCOL);
        assert!(err.message.contains("cannotDisseminateFormat"));
        assert!(err.message.contains("dim not supported"));
    }

    #[test]
    fn no_records_match_is_an_empty_harvest() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/oai");
            then.status(200)
                .body("<OAI-PMH><error code=\"noRecordsMatch\">empty</error></OAI-PMH>");
        });

        let harvest = harvest_records(&client(), &server.url("/oai")).unwrap();
        assert!(harvest.records.is_empty());
        assert_eq!(harvest.session.pages, 0);
    }

    #[test]
    fn unparseable_page_is_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/oai");
            then.status(200).body("<OAI-PMH><ListRecords><record><header>");
        });

        let err = harvest_records(&client(), &server.url("/oai")).unwrap_err();
        assert_eq!(err.code, EXIT_PARSE);
    }

    #[test]
    fn persistent_503_stops_after_throttle_cap() {
        let server = MockServer::start();
        let busy = server.mock(|when, then| {
            when.method(GET).path("/oai").query_param("resumptionToken", "t1");
            then.status(503).header("Retry-After", "0");
        });
        server.mock(|when, then| {
            when.method(GET).path("/oai").query_param("metadataPrefix", "dim");
            then.status(200).body(page(&["oai:1"], Some("t1")));
        });

        // The server never recovers, so the throttle cap ends the harvest;
        // the recovery budget is untouched.
        let config = HarvestConfig {
            backoff_secs: 0,
            max_throttle_waits: 2,
            ..HarvestConfig::default()
        };
        let client = FetchClient::new("OAI-PMH", &config).unwrap();
        let err = harvest_records(&client, &server.url("/oai")).unwrap_err();
        assert_eq!(err.code, EXIT_FETCH_UPSTREAM);
        busy.assert_hits(3);
    }
}
