//! Integration tests for the connectors
//!
//! These tests run the full pipeline (query builder, cache gate, fetcher,
//! normalizer, assembler) against mocked HTTP endpoints and an in-memory
//! knowledge store. No real network access.

#![cfg(all(feature = "clinical-trials", feature = "pubmed"))]

use biomed_connect::config::ConnectorConfig;
use biomed_connect::kb::MemoryStore;
use biomed_connect::models::{
    ArticleFetchRequest, LiteratureSearchRequest, TrialSearchRequest,
};
use biomed_connect::{
    ClinicalTrialsConnector, Connector, PubMedFetchConnector, PubMedSearchConnector,
};
use mockito::Matcher;
use serde_json::json;

fn trials_connector(server: &mockito::ServerGuard) -> ClinicalTrialsConnector {
    ClinicalTrialsConnector::new(&ConnectorConfig::default())
        .unwrap()
        .with_base_url(format!("{}/api/v2/studies", server.url()))
}

fn pubmed_search_connector(server: &mockito::ServerGuard) -> PubMedSearchConnector {
    PubMedSearchConnector::new(&ConnectorConfig::default())
        .unwrap()
        .with_base_url(server.url())
}

fn pubmed_fetch_connector(server: &mockito::ServerGuard) -> PubMedFetchConnector {
    PubMedFetchConnector::new(&ConnectorConfig::default())
        .unwrap()
        .with_base_url(server.url())
}

fn ctgov_body() -> String {
    json!({
        "totalCount": 128,
        "studies": [
            {
                "protocolSection": {
                    "identificationModule": {
                        "nctId": "NCT04267848",
                        "briefTitle": "Pembrolizumab in Advanced Melanoma"
                    },
                    "statusModule": {
                        "overallStatus": "RECRUITING",
                        "lastUpdatePostDateStruct": {"date": "2024-03-01"}
                    },
                    "designModule": {"studyType": "INTERVENTIONAL", "phases": ["PHASE3"]},
                    "conditionsModule": {"conditions": ["Melanoma"]},
                    "sponsorCollaboratorsModule": {"leadSponsor": {"name": "Merck"}}
                }
            },
            {
                "protocolSection": {
                    "identificationModule": {"briefTitle": "Malformed: no identifier"}
                }
            }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_ctgov_search_normalizes_and_counts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ctgov_body())
        .expect(1)
        .create_async()
        .await;

    let connector = trials_connector(&server);
    let request = TrialSearchRequest::new().condition("Melanoma");
    let response = connector.execute(&request, None).await;

    mock.assert_async().await;
    assert!(response.is_success());

    let payload = response.payload.unwrap();
    // The malformed study is dropped from results_returned while the
    // upstream total is preserved.
    assert_eq!(payload["total_results"], 128);
    assert_eq!(payload["results_returned"], 1);
    assert_eq!(payload["studies"][0]["nct_id"], "NCT04267848");
    assert_eq!(payload["studies"][0]["overall_status"], "RECRUITING");
    assert_eq!(payload["search_parameters"]["query.cond"], "Melanoma");
    assert_eq!(payload["search_metadata"]["source"], "clinicaltrials.gov");

    assert_eq!(response.knowledge_items.len(), 1);
    let item = &response.knowledge_items[0];
    assert_eq!(item.item_type, "CLINICAL_TRIALS_SEARCH_RESULTS");
    assert!(item.source_uri.starts_with("clinical_trials://"));
    assert!(item.source_uri.contains("query.cond=Melanoma"));
    assert_eq!(item.metadata["result_count"], 1);
}

#[tokio::test]
async fn test_ctgov_cache_hit_short_circuits_fetch() {
    let mut server = mockito::Server::new_async().await;
    // One fetch for the cold call; the warm call must not hit the network.
    let mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ctgov_body())
        .expect(1)
        .create_async()
        .await;

    let connector = trials_connector(&server);
    let request = TrialSearchRequest::new().condition("Melanoma");

    let cold = connector.execute(&request, None).await;
    let item = &cold.knowledge_items[0];

    let store = MemoryStore::new();
    store.insert(item.source_uri.as_str(), item.content.clone());

    let warm = connector.execute(&request, Some(&store)).await;
    mock.assert_async().await;

    assert!(warm.is_success());
    assert!(warm.knowledge_items.is_empty());

    // The warm payload equals the cold one, modulo the provenance tag.
    let mut expected = cold.payload.unwrap();
    expected
        .as_object_mut()
        .unwrap()
        .insert("source".to_string(), json!("knowledge_base_cache"));
    assert_eq!(warm.payload.unwrap(), expected);
}

#[tokio::test]
async fn test_ctgov_rate_limit_is_distinct_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let connector = trials_connector(&server);
    let request = TrialSearchRequest::new().condition("Melanoma");
    let response = connector.execute(&request, None).await;

    assert!(!response.is_success());
    let message = response.error_message.unwrap();
    assert!(message.contains("rate limit exceeded"), "got: {}", message);
}

#[tokio::test]
async fn test_ctgov_upstream_error_carries_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("maintenance window")
        .create_async()
        .await;

    let connector = trials_connector(&server);
    let request = TrialSearchRequest::new().condition("Melanoma");
    let response = connector.execute(&request, None).await;

    assert!(!response.is_success());
    let message = response.error_message.unwrap();
    assert!(message.contains("503"), "got: {}", message);
    assert!(message.contains("maintenance window"), "got: {}", message);
}

#[tokio::test]
async fn test_ctgov_empty_result_set_is_success() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"totalCount": 0, "studies": []}).to_string())
        .create_async()
        .await;

    let connector = trials_connector(&server);
    let request = TrialSearchRequest::new().query("no such trial");
    let response = connector.execute(&request, None).await;

    assert!(response.is_success());
    let payload = response.payload.unwrap();
    assert_eq!(payload["total_results"], 0);
    assert_eq!(payload["studies"], json!([]));
    assert!(payload["message"].as_str().unwrap().contains("No clinical trials"));
    assert!(response.knowledge_items.is_empty());
}

fn esearch_body() -> &'static str {
    r#"<eSearchResult>
         <Count>42</Count>
         <RetMax>2</RetMax>
         <IdList>
           <Id>31452104</Id>
           <Id>28915257</Id>
         </IdList>
       </eSearchResult>"#
}

fn efetch_body() -> &'static str {
    r#"<PubmedArticleSet>
         <PubmedArticle>
           <MedlineCitation>
             <PMID>31452104</PMID>
             <Article>
               <Journal><Title>The Lancet</Title></Journal>
               <ArticleTitle>First article.</ArticleTitle>
             </Article>
           </MedlineCitation>
         </PubmedArticle>
         <PubmedArticle>
           <MedlineCitation>
             <PMID>28915257</PMID>
             <Article>
               <Journal><Title>The Lancet. Oncology</Title></Journal>
               <ArticleTitle>Second article.</ArticleTitle>
             </Article>
           </MedlineCitation>
         </PubmedArticle>
       </PubmedArticleSet>"#
}

#[tokio::test]
async fn test_pubmed_search_two_phase() {
    let mut server = mockito::Server::new_async().await;
    let esearch = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("sort".into(), "relevance".into()),
            Matcher::UrlEncoded("retmax".into(), "20".into()),
        ]))
        .with_status(200)
        .with_body(esearch_body())
        .expect(1)
        .create_async()
        .await;
    // One batched detail call for all identifiers.
    let efetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "31452104,28915257".into()),
            Matcher::UrlEncoded("rettype".into(), "abstract".into()),
        ]))
        .with_status(200)
        .with_body(efetch_body())
        .expect(1)
        .create_async()
        .await;

    let connector = pubmed_search_connector(&server);
    let request = LiteratureSearchRequest::new("glycaemic control");
    let response = connector.execute(&request, None).await;

    esearch.assert_async().await;
    efetch.assert_async().await;

    assert!(response.is_success());
    let payload = response.payload.unwrap();
    assert_eq!(payload["total_results"], 42);
    assert_eq!(payload["results_returned"], 2);
    // esearch order defines result order.
    assert_eq!(payload["articles"][0]["pmid"], "31452104");
    assert_eq!(payload["articles"][1]["pmid"], "28915257");
    assert_eq!(payload["articles"][1]["journal"], "The Lancet. Oncology");

    assert_eq!(response.knowledge_items.len(), 1);
    let item = &response.knowledge_items[0];
    assert_eq!(item.item_type, "PUBMED_SEARCH_RESULTS");
    assert!(item.source_uri.starts_with("ncbi_search://"));

    // A later identical request served from the store returns the same
    // content, tagged with cache provenance.
    let store = MemoryStore::new();
    store.insert(item.source_uri.as_str(), item.content.clone());
    let warm = connector.execute(&request, Some(&store)).await;

    assert!(warm.is_success());
    let warm_payload = warm.payload.unwrap();
    assert_eq!(warm_payload["source"], "knowledge_base_cache");
    assert_eq!(warm_payload["articles"], payload["articles"]);
}

#[tokio::test]
async fn test_pubmed_search_no_hits_skips_detail_fetch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<eSearchResult><Count>0</Count><IdList></IdList></eSearchResult>")
        .create_async()
        .await;
    let efetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let connector = pubmed_search_connector(&server);
    let request = LiteratureSearchRequest::new("zxqv nonsense term");
    let response = connector.execute(&request, None).await;

    efetch.assert_async().await;
    assert!(response.is_success());
    let payload = response.payload.unwrap();
    assert_eq!(payload["total_results"], 0);
    assert_eq!(payload["articles"], json!([]));
    assert!(response.knowledge_items.is_empty());
}

#[tokio::test]
async fn test_pubmed_search_rate_limit_kind_differs_from_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let rate_limited = pubmed_search_connector(&server)
        .execute(&LiteratureSearchRequest::new("cancer"), None)
        .await;

    let mut failing_server = mockito::Server::new_async().await;
    failing_server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let upstream = pubmed_search_connector(&failing_server)
        .execute(&LiteratureSearchRequest::new("cancer"), None)
        .await;

    let rate_message = rate_limited.error_message.unwrap();
    let upstream_message = upstream.error_message.unwrap();
    assert!(rate_message.contains("rate limit exceeded"));
    assert!(upstream_message.contains("500"));
    assert_ne!(rate_message, upstream_message);
}

#[tokio::test]
async fn test_pubmed_fetch_only_fetches_uncached_pmids() {
    let mut server = mockito::Server::new_async().await;
    let efetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "28915257".into()),
            Matcher::UrlEncoded("rettype".into(), "full".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"<PubmedArticleSet>
                 <PubmedArticle>
                   <MedlineCitation>
                     <PMID>28915257</PMID>
                     <Article><ArticleTitle>Fresh article.</ArticleTitle></Article>
                   </MedlineCitation>
                 </PubmedArticle>
               </PubmedArticleSet>"#,
        )
        .expect(1)
        .create_async()
        .await;

    let store = MemoryStore::new();
    store.insert(
        "ncbi_article://31452104_detailed",
        json!({"pmid": "31452104", "title": "Cached article."}),
    );

    let connector = pubmed_fetch_connector(&server);
    let request = ArticleFetchRequest::new(["31452104", "28915257"]);
    let response = connector.execute(&request, Some(&store)).await;

    efetch.assert_async().await;
    assert!(response.is_success());

    let payload = response.payload.unwrap();
    assert_eq!(payload["articles_found"], 2);
    assert_eq!(payload["articles"][0]["title"], "Cached article.");
    assert_eq!(payload["articles"][1]["title"], "Fresh article.");
    assert_eq!(payload["fetch_metadata"]["cached_articles"], 1);
    assert_eq!(payload["fetch_metadata"]["newly_fetched"], 1);

    // Only the newly fetched article is proposed for persistence.
    assert_eq!(response.knowledge_items.len(), 1);
    let item = &response.knowledge_items[0];
    assert_eq!(item.source_uri, "ncbi_article://28915257_detailed");
    assert_eq!(item.item_type, "PUBMED_ARTICLE_DETAILS");
    assert_eq!(item.metadata["pmid"], "28915257");
}

#[tokio::test]
async fn test_pubmed_fetch_invalid_pmids_make_no_network_call() {
    let mut server = mockito::Server::new_async().await;
    let efetch = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let connector = pubmed_fetch_connector(&server);
    let request = ArticleFetchRequest::new(["PMC5614853", "not-a-pmid"]);
    let response = connector.execute(&request, None).await;

    efetch.assert_async().await;
    assert!(!response.is_success());
    assert!(response
        .error_message
        .unwrap()
        .contains("PMIDs must be numeric"));
}

#[tokio::test]
async fn test_pubmed_fetch_mixed_pmids_drop_malformed_and_proceed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "31452104".into()))
        .with_status(200)
        .with_body(
            r#"<PubmedArticleSet>
                 <PubmedArticle>
                   <MedlineCitation>
                     <PMID>31452104</PMID>
                     <Article><ArticleTitle>Survivor.</ArticleTitle></Article>
                   </MedlineCitation>
                 </PubmedArticle>
               </PubmedArticleSet>"#,
        )
        .expect(1)
        .create_async()
        .await;

    let connector = pubmed_fetch_connector(&server);
    let request = ArticleFetchRequest::new(["31452104", "bogus"]);
    let response = connector.execute(&request, None).await;

    assert!(response.is_success());
    let payload = response.payload.unwrap();
    assert_eq!(payload["pmids_requested"], json!(["31452104"]));
    assert_eq!(payload["articles_found"], 1);
}
