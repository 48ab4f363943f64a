//! Integration tests for QueryService and MetadataService

mod common;

use common::{MockFactory, MockWarehouse, name_row};
use pretty_assertions::assert_eq;
use sqlfan_core::{Row, SqlfanError};
use sqlfan_query::{ObjectKind, RetryPolicy, RunnerOptions};
use sqlfan_services::{MetadataService, QueryService, ServiceError};
use std::sync::Arc;
use std::time::Duration;

mod query_service {
    use pretty_assertions::assert_eq;
    use super::*;

    #[tokio::test]
    async fn test_execute_script_reports_each_statement() {
        let warehouse = MockWarehouse::new();
        warehouse.respond("SELECT 1", vec![Row::from_pairs([("1", 1i64)])]);
        warehouse.fail(
            "SELEC ",
            SqlfanError::Query("syntax error line 1 at position 0 unexpected 'SELEC'.".into()),
        );
        let service = QueryService::new(
            Arc::new(MockFactory(warehouse.clone())),
            RunnerOptions::default(),
        );

        let execution = service
            .execute_script("SELECT 1;\n SELEC 2; CREATE TABLE T (X INT);")
            .await;

        assert_eq!(execution.summary.total, 3);
        assert_eq!(execution.summary.succeeded, 2);
        assert_eq!(execution.summary.failed, 1);
        assert!(execution.summary.has_failures());
        assert_eq!(
            execution.results[1].error_message(),
            Some("syntax error line 1 at position 0 unexpected 'SELEC'.")
        );
        assert_eq!(execution.results[2].rows().map(|r| r.len()), Some(0));
        assert_eq!(warehouse.connects(), 3);
        assert_eq!(warehouse.closes(), 3);
    }

    #[tokio::test]
    async fn test_blank_script_opens_no_session() {
        let warehouse = MockWarehouse::new();
        let service = QueryService::new(
            Arc::new(MockFactory(warehouse.clone())),
            RunnerOptions::default(),
        );

        let execution = service.execute_script(" ; \n ;").await;

        assert!(execution.results.is_empty());
        assert!(!execution.summary.has_failures());
        assert_eq!(warehouse.connects(), 0);
    }
}

mod metadata_service {
    use pretty_assertions::assert_eq;
    use super::*;

    fn service(warehouse: &Arc<MockWarehouse>) -> MetadataService {
        MetadataService::new(Arc::new(MockFactory(warehouse.clone())))
            .with_policy(RetryPolicy::new(3, Duration::from_secs(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_databases_cached_until_ttl() {
        let warehouse = MockWarehouse::new();
        warehouse.respond("SHOW DATABASES", vec![name_row("SALES"), name_row("HR")]);
        let metadata = service(&warehouse);

        assert_eq!(metadata.databases().await.unwrap(), vec!["SALES", "HR"]);
        assert_eq!(metadata.databases().await.unwrap(), vec!["SALES", "HR"]);
        assert_eq!(warehouse.query_count(), 1);

        tokio::time::advance(Duration::from_secs(301)).await;
        metadata.databases().await.unwrap();
        assert_eq!(warehouse.query_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_reload() {
        let warehouse = MockWarehouse::new();
        warehouse.respond("SHOW SCHEMAS IN DATABASE SALES", vec![name_row("PUBLIC")]);
        let metadata = service(&warehouse);

        metadata.schemas("SALES").await.unwrap();
        metadata.invalidate();
        let schemas = metadata.schemas("SALES").await.unwrap();

        assert_eq!(schemas, vec!["PUBLIC"]);
        assert_eq!(warehouse.query_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_is_keyed_per_listing() {
        let warehouse = MockWarehouse::new();
        warehouse.respond("SHOW TABLES IN SCHEMA SALES.PUBLIC", vec![name_row("ORDERS")]);
        warehouse.respond("SHOW VIEWS IN SCHEMA SALES.PUBLIC", vec![name_row("ORDERS_V")]);
        let metadata = service(&warehouse);

        let tables = metadata
            .objects(ObjectKind::Table, "SALES", "PUBLIC")
            .await
            .unwrap();
        let views = metadata
            .objects(ObjectKind::View, "SALES", "PUBLIC")
            .await
            .unwrap();

        assert_eq!(tables, vec!["ORDERS"]);
        assert_eq!(views, vec!["ORDERS_V"]);
        assert_eq!(warehouse.query_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_retries_then_fails_without_caching() {
        let warehouse = MockWarehouse::new();
        warehouse.fail("SHOW DATABASES", SqlfanError::Query("warehouse suspended".into()));
        let metadata = service(&warehouse);

        let err = metadata.databases().await.unwrap_err();

        assert!(matches!(err, ServiceError::Core(SqlfanError::Query(ref m)) if m == "warehouse suspended"));
        assert_eq!(warehouse.query_count(), 3);
        assert_eq!(warehouse.closes(), 1);

        metadata.databases().await.unwrap_err();
        assert_eq!(warehouse.query_count(), 6);
    }

    #[tokio::test]
    async fn test_object_ddl_joined_in_order() {
        let warehouse = MockWarehouse::new();
        warehouse.respond(
            "'DB.SCH.ADD_ONE(NUMBER)'",
            vec![Row::from_pairs([("ddl", "create function ADD_ONE(X NUMBER)")])],
        );
        warehouse.respond(
            "'DB.SCH.ORDERS'",
            vec![Row::from_pairs([("ddl", "create table ORDERS (ID NUMBER)")])],
        );
        let metadata = service(&warehouse);

        let ddl = metadata
            .object_ddl(
                ObjectKind::Function,
                "DB",
                "SCH",
                &["ADD_ONE(NUMBER) RETURN NUMBER".to_string(), "ORDERS".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(
            ddl,
            format!(
                "create function ADD_ONE(X NUMBER){}create table ORDERS (ID NUMBER)",
                sqlfan_query::DDL_SEPARATOR
            )
        );
        assert_eq!(
            warehouse.query_log(),
            vec![
                "SELECT GET_DDL('Function', 'DB.SCH.ADD_ONE(NUMBER)', true)",
                "SELECT GET_DDL('Function', 'DB.SCH.ORDERS', true)",
            ]
        );
        assert_eq!(warehouse.closes(), 1);
    }

    #[tokio::test]
    async fn test_database_ddl() {
        let warehouse = MockWarehouse::new();
        warehouse.respond(
            "GET_DDL('DATABASE', 'SALES', true)",
            vec![Row::from_pairs([("ddl", "create or replace database SALES;")])],
        );
        let metadata = service(&warehouse);

        let ddl = metadata.database_ddl("SALES").await.unwrap();

        assert_eq!(ddl, "create or replace database SALES;");
    }

    #[tokio::test]
    async fn test_connection_failure_surfaces() {
        let warehouse = MockWarehouse::new();
        warehouse.refuse_connections();
        let metadata = service(&warehouse);

        let err = metadata.database_ddl("SALES").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(SqlfanError::Connection(_))));
    }
}
