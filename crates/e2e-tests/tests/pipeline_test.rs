//! End-to-end pipeline tests for the trend finder.
//!
//! Sheet -> checkpointed embedding -> final artifact -> clustering ->
//! headlines -> report.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{direction, TestHarness};
use trend_cli::{summarize_all, TrendReport};
use trend_clusters::{
    ClusterSummarizer, ClusteringConfig, MockLlmClient, SimilarityClusterer, SummaryConfig,
};
use trend_embeddings::MockEmbeddingService;
use trend_ingest::load_findings;

const SHEET: &str = "\
Stat,Resource Name,Date,Link
Phishing attacks rose 40% year over year,Threat Report,2024-01-10,https://example.com/a
Credential phishing now targets MFA prompts,Email Security Survey,2024-02-01,
\"Ransomware groups shifted to data extortion, not encryption\",,2024-03-05,
Ransomware payments fell despite more attacks,Incident Review,,
Quantum computing budgets doubled,,,
";

fn mock_service() -> MockEmbeddingService {
    MockEmbeddingService::new(3)
        .with_vector("Phishing attacks rose 40% year over year", direction(0.0, 0.0))
        .with_vector("Credential phishing now targets MFA prompts", direction(5.0, 0.0))
        .with_vector(
            "Ransomware groups shifted to data extortion, not encryption",
            direction(90.0, 0.0),
        )
        .with_vector("Ransomware payments fell despite more attacks", direction(95.0, 0.0))
        .with_vector("Quantum computing budgets doubled", vec![0.0, 0.0, 1.0])
}

/// Full pipeline: every finding is embedded, the two themes cluster apart,
/// the outlier is noise and each cluster gets a headline.
#[tokio::test]
async fn test_full_pipeline_sheet_to_report() {
    let harness = TestHarness::new();
    let source = harness.write_sheet(SHEET);

    // 1. Ingest
    let findings = load_findings(&source).await.unwrap();
    assert_eq!(findings.len(), 5);
    let texts: Vec<String> = findings.iter().map(|f| f.text.clone()).collect();

    // 2. Embed in batches of 2
    let service = Arc::new(mock_service());
    let outcome = harness
        .embedder(service.clone(), 2, Duration::ZERO)
        .run(&texts)
        .await
        .unwrap();

    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.embedded, 3);
    assert!(outcome.final_written);
    assert_eq!(service.call_count(), 3);
    assert!(!harness.store.partial_path().exists());

    // 3. Final artifact preserves row order
    let artifact = harness.store.load_final().unwrap();
    assert_eq!(artifact.len(), 5);
    assert_eq!(artifact.dimension, 3);
    let stored: Vec<&str> = artifact.texts();
    let expected: Vec<&str> = texts.iter().map(String::as_str).collect();
    assert_eq!(stored, expected);

    // 4. Cluster
    let clusterer = SimilarityClusterer::new(ClusteringConfig::default()).unwrap();
    let clusters = clusterer.cluster(&artifact.embeddings()).unwrap();
    let members: Vec<Vec<usize>> = clusters.iter().map(|c| c.members.clone()).collect();
    assert_eq!(members, vec![vec![0, 1], vec![2, 3]]);

    // 5. Headlines
    let llm = Arc::new(MockLlmClient::new("  Phishing adapts to get past MFA \n"));
    let summarizer = ClusterSummarizer::new(llm.clone(), SummaryConfig::default());
    let headlines = summarize_all(&summarizer, &clusters, &artifact.texts()).await;

    assert_eq!(headlines.len(), 2);
    assert_eq!(headlines[0].as_deref(), Some("Phishing adapts to get past MFA"));
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].ends_with(
        "- Phishing attacks rose 40% year over year\n- Credential phishing now targets MFA prompts"
    ));

    // 6. Report with provenance
    let report = TrendReport::build(&artifact.records, &clusters, &headlines, Some(&findings));
    assert_eq!(report.noise, 1);

    let text = report.render_text();
    assert!(text.contains("Cluster 0 (2 findings)\n"));
    assert!(text.contains(
        "- \"Phishing attacks rose 40% year over year\" — Threat Report [https://example.com/a] (2024-01-10)\n"
    ));
    assert!(text.contains(
        "- \"Ransomware groups shifted to data extortion, not encryption\" — Unknown Resource (2024-03-05)\n"
    ));
    assert!(text.contains(
        "- \"Ransomware payments fell despite more attacks\" — Incident Review (Unknown Date)\n"
    ));
    assert!(!text.contains("Quantum"));
}

/// A sheet where nothing is similar produces the empty-report message.
#[tokio::test]
async fn test_pipeline_without_trends() {
    let harness = TestHarness::new();
    let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
    let service = Arc::new(
        MockEmbeddingService::new(3)
            .with_vector("alpha", vec![1.0, 0.0, 0.0])
            .with_vector("beta", vec![0.0, 1.0, 0.0])
            .with_vector("gamma", vec![0.0, 0.0, 1.0]),
    );

    harness
        .embedder(service, 100, Duration::ZERO)
        .run(&texts)
        .await
        .unwrap();

    let artifact = harness.store.load_final().unwrap();
    let clusters = SimilarityClusterer::new(ClusteringConfig::default())
        .unwrap()
        .cluster(&artifact.embeddings())
        .unwrap();
    assert!(clusters.is_empty());

    let report = TrendReport::build(&artifact.records, &clusters, &[], None);
    assert_eq!(report.render_text(), "No strong trend groups found.\n");
}

/// A failing summarizer leaves the cluster without a headline but still
/// reports it.
#[tokio::test]
async fn test_headline_failure_is_not_fatal() {
    let harness = TestHarness::new();
    let source = harness.write_sheet(SHEET);
    let findings = load_findings(&source).await.unwrap();
    let texts: Vec<String> = findings.iter().map(|f| f.text.clone()).collect();

    harness
        .embedder(Arc::new(mock_service()), 10, Duration::ZERO)
        .run(&texts)
        .await
        .unwrap();

    let artifact = harness.store.load_final().unwrap();
    let clusters = SimilarityClusterer::new(ClusteringConfig::default())
        .unwrap()
        .cluster(&artifact.embeddings())
        .unwrap();

    let summarizer = ClusterSummarizer::new(
        Arc::new(MockLlmClient::failing("quota exhausted")),
        SummaryConfig::default(),
    );
    let headlines = summarize_all(&summarizer, &clusters, &artifact.texts()).await;
    assert_eq!(headlines, vec![None, None]);

    let report = TrendReport::build(&artifact.records, &clusters, &headlines, None);
    assert_eq!(report.trends.len(), 2);
    assert!(report.render_text().contains("Headline: (none)"));
}
