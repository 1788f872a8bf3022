//! Forward-transition behavior of the workflow orchestrator against mocked
//! service clients: stage progression, cache reuse, selection validation,
//! and the export precondition ordering.

use std::sync::Arc;

use bedflow_core::{WorkflowOrchestrator, WorkflowStage};
use bedflow_interfaces::{ExportType, WorkflowError};
use bedflow_test_utils::{
    create_mock_clustering_client, create_mock_export_client, create_mock_processing_client,
    sample_assignment, sample_enhanced_color_set, sample_export_validation,
    sample_processing_result, sample_upload_file, MockClusteringClient,
    MockDxfExportClient, MockImageProcessingClient,
};
use pretty_assertions::assert_eq;

fn orchestrator(
    processing: MockImageProcessingClient,
    clustering: MockClusteringClient,
    export: MockDxfExportClient,
) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(Arc::new(processing), Arc::new(clustering), Arc::new(export))
}

#[tokio::test]
async fn forward_transitions_compose_to_results() {
    let orchestrator = orchestrator(
        create_mock_processing_client(),
        create_mock_clustering_client(),
        create_mock_export_client(),
    );
    assert_eq!(orchestrator.snapshot().stage, WorkflowStage::Upload);

    let snapshot = orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Enhancement);
    // The cached artifact is exactly the mock payload.
    assert_eq!(
        *snapshot.processing.as_deref().unwrap(),
        sample_processing_result("session-1", 3)
    );

    let snapshot = orchestrator.select_method("pca_features").await.unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Clustering);
    assert_eq!(
        snapshot.selection.as_deref().unwrap().method,
        "pca_features"
    );

    let snapshot = orchestrator
        .submit_assignment(&sample_assignment())
        .await
        .unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Results);
    assert!(snapshot.clustering.is_some());
    assert!(snapshot.error.is_none());
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn concrete_scenario_from_upload_to_results() {
    // upload -> s1 with 3 beds; methods original + pca_features;
    // pca_features selected; bedA=[0,1] bedB=[2] covers everything.
    let mut processing = MockImageProcessingClient::new();
    processing
        .expect_process_image()
        .times(1)
        .returning(|_| Ok(sample_processing_result("s1", 3)));

    let beds = sample_processing_result("s1", 3).bed_data;
    let full_set = sample_enhanced_color_set(&beds);
    let pca_rows = full_set.rows("pca_features").unwrap().clone();

    let orchestrator = orchestrator(
        processing,
        create_mock_clustering_client(),
        MockDxfExportClient::new(),
    );

    let snapshot = orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    assert_eq!(snapshot.session_id(), Some("s1"));
    assert_eq!(snapshot.bed_count(), 3);

    let snapshot = orchestrator.select_method("pca_features").await.unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Clustering);
    assert_eq!(snapshot.selection.as_deref().unwrap().plot_data, pca_rows);

    let snapshot = orchestrator
        .submit_assignment(&sample_assignment())
        .await
        .unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Results);
    assert_eq!(
        snapshot
            .clustering
            .as_deref()
            .unwrap()
            .statistics
            .coverage_percent,
        100.0
    );
}

#[tokio::test]
async fn reselecting_after_going_back_reuses_cached_colors() {
    let mut clustering = MockClusteringClient::new();
    // The cache-reuse invariant: one fetch for the whole session.
    clustering
        .expect_create_enhanced_colors()
        .times(1)
        .returning(|beds| Ok(sample_enhanced_color_set(beds)));
    clustering
        .expect_process_clustering()
        .returning(|beds, _, assignment| {
            Ok(bedflow_test_utils::sample_clustering_result(
                assignment,
                beds.len(),
            ))
        });

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        clustering,
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    orchestrator.select_method("pca_features").await.unwrap();

    let snapshot = orchestrator.go_back().unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Enhancement);
    assert!(snapshot.selection.is_none());
    assert!(snapshot.enhanced_colors.is_some());

    // Second selection must be served from the cache.
    let snapshot = orchestrator.select_method("pca_features").await.unwrap();
    assert_eq!(snapshot.stage, WorkflowStage::Clustering);
}

#[tokio::test]
async fn unknown_method_fails_without_extra_network_calls() {
    let mut clustering = MockClusteringClient::new();
    clustering
        .expect_create_enhanced_colors()
        .times(1)
        .returning(|beds| Ok(sample_enhanced_color_set(beds)));

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        clustering,
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();

    let err = orchestrator.select_method("tsne").await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidSelection(_)));
    assert_eq!(orchestrator.snapshot().stage, WorkflowStage::Enhancement);

    // Retry with another bad name: the color set is already cached, so the
    // times(1) expectation above proves no additional call happened.
    let err = orchestrator.select_method("umap").await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidSelection(_)));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.stage, WorkflowStage::Enhancement);
    assert!(snapshot.error.as_deref().unwrap().contains("umap"));
}

#[tokio::test]
async fn enhancement_methods_lists_and_caches_the_set() {
    let mut clustering = MockClusteringClient::new();
    clustering
        .expect_create_enhanced_colors()
        .times(1)
        .returning(|beds| Ok(sample_enhanced_color_set(beds)));

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        clustering,
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();

    let methods = orchestrator.enhancement_methods().await.unwrap();
    assert_eq!(
        methods,
        vec!["original", "enhanced_saturation", "pca_features"]
    );

    // The selection right after must reuse the same cached set.
    orchestrator.select_method("original").await.unwrap();
}

#[tokio::test]
async fn five_bed_original_colors_round_trip() {
    let mut processing = MockImageProcessingClient::new();
    processing
        .expect_process_image()
        .returning(|_| Ok(sample_processing_result("s5", 5)));

    let orchestrator = orchestrator(
        processing,
        create_mock_clustering_client(),
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    let snapshot = orchestrator.select_method("pca_features").await.unwrap();

    let selection = snapshot.selection.as_deref().unwrap();
    let beds = &snapshot.processing.as_deref().unwrap().bed_data;
    assert_eq!(selection.original_colors.len(), 5);
    for (color, bed) in selection.original_colors.iter().zip(beds) {
        assert_eq!(*color, bed.rgb_median);
    }
}

#[tokio::test]
async fn upload_failure_keeps_stage_and_cache_untouched() {
    let mut processing = MockImageProcessingClient::new();
    processing.expect_process_image().returning(|_| {
        Err(WorkflowError::ServiceError {
            service: "image-processing".to_string(),
            status: 500,
            message: "segmentation failed".to_string(),
        })
    });

    let orchestrator = orchestrator(
        processing,
        MockClusteringClient::new(),
        MockDxfExportClient::new(),
    );

    let err = orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ServiceError { .. }));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.stage, WorkflowStage::Upload);
    assert!(snapshot.processing.is_none());
    assert!(!snapshot.loading);
    assert!(snapshot
        .error
        .as_deref()
        .unwrap()
        .contains("segmentation failed"));
}

#[tokio::test]
async fn invalid_file_is_rejected_before_any_call() {
    let mut processing = MockImageProcessingClient::new();
    processing.expect_process_image().times(0);

    let orchestrator = orchestrator(
        processing,
        MockClusteringClient::new(),
        MockDxfExportClient::new(),
    );

    let file = bedflow_interfaces::UploadFile::new("plan.gif", "image/gif", vec![0; 8]);
    let err = orchestrator.submit_image(file).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidFile(_)));
    assert_eq!(orchestrator.snapshot().stage, WorkflowStage::Upload);
}

#[tokio::test]
async fn clustering_failure_stays_in_clustering() {
    let mut clustering = MockClusteringClient::new();
    clustering
        .expect_create_enhanced_colors()
        .returning(|beds| Ok(sample_enhanced_color_set(beds)));
    clustering.expect_process_clustering().returning(|_, _, _| {
        Err(WorkflowError::NetworkError {
            message: "connection refused".to_string(),
            timeout: false,
        })
    });

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        clustering,
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    orchestrator.select_method("original").await.unwrap();

    let err = orchestrator
        .submit_assignment(&sample_assignment())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NetworkError { .. }));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.stage, WorkflowStage::Clustering);
    // The selection survives, so a resubmission needs no redrawing.
    assert!(snapshot.selection.is_some());
    assert!(snapshot.clustering.is_none());
}

#[tokio::test]
async fn export_calls_validate_first_and_derives_cluster_dict() {
    let mut export = MockDxfExportClient::new();
    export
        .expect_validate_export()
        .times(1)
        .withf(|_, dict| {
            dict.get("0").map(String::as_str) == Some("bedA")
                && dict.get("1").map(String::as_str) == Some("bedB")
        })
        .returning(|_, _| Ok(sample_export_validation(true, &[])));
    export
        .expect_export_dxf()
        .times(1)
        .withf(|_, dict, export_type| {
            dict.len() == 2 && *export_type == ExportType::Detailed
        })
        .returning(|_, _, _| {
            Ok(bedflow_interfaces::ExportArtifact {
                bytes: b"EOF".to_vec(),
                file_name: "beds_detailed.dxf".to_string(),
            })
        });

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        create_mock_clustering_client(),
        export,
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    orchestrator.select_method("original").await.unwrap();
    orchestrator
        .submit_assignment(&sample_assignment())
        .await
        .unwrap();

    let artifact = orchestrator.export(ExportType::Detailed).await.unwrap();
    assert_eq!(artifact.file_name, "beds_detailed.dxf");
    // Export is a self-transition.
    assert_eq!(orchestrator.snapshot().stage, WorkflowStage::Results);
}

#[tokio::test]
async fn blocked_export_carries_messages_and_skips_the_export_call() {
    let mut export = MockDxfExportClient::new();
    export
        .expect_validate_export()
        .times(1)
        .returning(|_, _| Ok(sample_export_validation(false, &["no clusters"])));
    export.expect_export_dxf().times(0);

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        create_mock_clustering_client(),
        export,
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();
    orchestrator.select_method("original").await.unwrap();
    orchestrator
        .submit_assignment(&sample_assignment())
        .await
        .unwrap();

    let err = orchestrator.export(ExportType::Detailed).await.unwrap_err();
    match err {
        WorkflowError::ExportBlocked { messages } => {
            assert_eq!(messages, vec!["no clusters"]);
        }
        other => panic!("expected ExportBlocked, got {:?}", other),
    }
    assert_eq!(orchestrator.snapshot().stage, WorkflowStage::Results);
}

#[tokio::test]
async fn malformed_color_set_never_reaches_the_cache() {
    let mut clustering = MockClusteringClient::new();
    clustering.expect_create_enhanced_colors().returning(|_| {
        // Two rows for three beds.
        Ok(sample_enhanced_color_set(&bedflow_test_utils::sample_bed_records(2)))
    });

    let orchestrator = orchestrator(
        create_mock_processing_client(),
        clustering,
        MockDxfExportClient::new(),
    );

    orchestrator
        .submit_image(sample_upload_file())
        .await
        .unwrap();

    let err = orchestrator.select_method("original").await.unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedResponse { .. }));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.stage, WorkflowStage::Enhancement);
    assert!(snapshot.enhanced_colors.is_none());
    assert!(snapshot.selection.is_none());
}
