//! Person-graph harvest: department documents, then the units and
//! positions they link to, flattened into a name index.

use std::collections::HashSet;

use reqwest::header::ACCEPT;
use tracing::info;

use scholarlink_io::ntriples::{
    collect_people, objects_of, parse_ntriples, subjects_of, Triple, HR_POSITION_IN_UNIT,
    VIVO_RELATED_BY,
};
use scholarlink_recon::NameIndex;

use super::common::{FetchClient, FetchSession};
use crate::exit_codes::EXIT_PARSE;
use crate::CliError;

pub const N_TRIPLES: &str = "application/n-triples";

#[derive(Debug, Default)]
pub struct NameHarvest {
    pub index: NameIndex,
    pub session: FetchSession,
}

/// Fetch the department URIs, then every object of `vivo:relatedBy`, then
/// every subject of `hr:positionInUnit` found in the merged graph. Each URI
/// is fetched at most once. Any fetch or parse failure is fatal.
pub fn harvest_names(client: &FetchClient, departments: &[String]) -> Result<NameHarvest, CliError> {
    let mut crawl = Crawl {
        client,
        session: FetchSession::default(),
        fetched: HashSet::new(),
        triples: Vec::new(),
    };

    for uri in departments {
        crawl.fetch(uri)?;
    }
    for uri in objects_of(&crawl.triples, VIVO_RELATED_BY) {
        crawl.fetch(&uri)?;
    }
    for uri in subjects_of(&crawl.triples, HR_POSITION_IN_UNIT) {
        crawl.fetch(&uri)?;
    }

    let mut index = NameIndex::new();
    crawl.session.records = collect_people(&crawl.triples, &mut index);
    info!(
        documents = crawl.session.pages,
        triples = crawl.triples.len(),
        people = index.len(),
        "person graph harvested"
    );

    Ok(NameHarvest {
        index,
        session: crawl.session,
    })
}

struct Crawl<'a> {
    client: &'a FetchClient,
    session: FetchSession,
    fetched: HashSet<String>,
    triples: Vec<Triple>,
}

impl Crawl<'_> {
    fn fetch(&mut self, uri: &str) -> Result<(), CliError> {
        if !self.fetched.insert(uri.to_string()) {
            return Ok(());
        }
        let body = self
            .client
            .get_text(&mut self.session, |http| http.get(uri).header(ACCEPT, N_TRIPLES))?;
        let triples = parse_ntriples(&body).map_err(|e| CliError {
            code: EXIT_PARSE,
            message: format!("{uri}: {e}"),
            hint: Some("the person-graph source must serve N-Triples".to_string()),
        })?;
        self.session.pages += 1;
        self.triples.extend(triples);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use httpmock::prelude::*;

    const TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";
    const PERSON: &str = "<http://xmlns.com/foaf/0.1/Person>";
    const PREF_LABEL: &str = "<http://www.w3.org/2004/02/skos/core#prefLabel>";
    const RELATED_BY: &str = "<http://vivoweb.org/ontology/core#relatedBy>";
    const IN_UNIT: &str = "<http://vivo.cornell.edu/ns/hr/0.9/hr.owl#positionInUnit>";

    fn client() -> FetchClient {
        let config = HarvestConfig {
            backoff_secs: 0,
            ..HarvestConfig::default()
        };
        FetchClient::new("person graph", &config).unwrap()
    }

    #[test]
    fn crawls_department_units_and_positions() {
        let server = MockServer::start();
        let dept = server.url("/dept");
        let unit = server.url("/unit");
        let pos = server.url("/pos");

        let dept_mock = server.mock(|when, then| {
            when.method(GET).path("/dept").header("accept", N_TRIPLES);
            then.status(200).body(format!(
                "<{dept}> {RELATED_BY} <{unit}> .\n\
                 <{pos}> {IN_UNIT} <{dept}> .\n\
                 <{dept}> {RELATED_BY} <{unit}> .\n"
            ));
        });
        let unit_mock = server.mock(|when, then| {
            when.method(GET).path("/unit");
            then.status(200).body(format!(
                "<http://v/p1> {TYPE} {PERSON} .\n\
                 <http://v/p1> {PREF_LABEL} \"Smith, John A.\" .\n"
            ));
        });
        let pos_mock = server.mock(|when, then| {
            when.method(GET).path("/pos");
            then.status(200).body(format!(
                "<http://v/p2> {TYPE} {PERSON} .\n\
                 <http://v/p2> {PREF_LABEL} \"Lee, Ann\" .\n\
                 <http://v/p3> {TYPE} {PERSON} .\n"
            ));
        });

        let harvest = harvest_names(&client(), &[dept.clone(), dept]).unwrap();
        dept_mock.assert_hits(1);
        unit_mock.assert_hits(1);
        pos_mock.assert_hits(1);

        let people: Vec<(&str, &str)> = harvest
            .index
            .iter()
            .map(|p| (p.id.as_str(), p.label.as_str()))
            .collect();
        assert_eq!(people, vec![("http://v/p1", "Smith, John A."), ("http://v/p2", "Lee, Ann")]);
        assert_eq!(harvest.session.pages, 3);
        assert_eq!(harvest.session.records, 2);
    }

    #[test]
    fn unparseable_department_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/dept");
            then.status(200).body("<html><body>not rdf</body></html>");
        });

        let err = harvest_names(&client(), &[server.url("/dept")]).unwrap_err();
        assert_eq!(err.code, EXIT_PARSE);
        assert!(err.message.contains("/dept"));
    }
}
