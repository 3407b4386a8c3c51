//! Dispatcher Module Tests
//!
//! Exercises `CacheService::dispatch` directly, without HTTP.
//!
//! ## Test Scopes
//! - **Operators**: GET / SET / SYNC / SHIFT / INFO contracts and response shapes.
//! - **Validation**: unsupported width, unknown operator, width mismatch, length mismatch.
//! - **Range handling**: out-of-range ids are skipped, not fatal.
//! - **Fault boundary**: a panicking request becomes a 500 and the node keeps serving.

#[cfg(test)]
mod tests {
    use crate::dispatcher::handlers::{handle_request, run_blocking};
    use crate::dispatcher::protocol::{CacheRequest, CacheResponse, ErrorResponse, Operator};
    use crate::dispatcher::service::CacheService;
    use crate::error::CacheError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::{Extension, Json};
    use std::sync::Arc;

    const CAPACITY: u64 = 16 * 1024;

    fn request(width: u32, operator: Operator, ids: Vec<i64>) -> CacheRequest {
        CacheRequest::new(width, "UidTest", operator).with_ids(ids)
    }

    // ============================================================
    // END-TO-END SCENARIOS
    // ============================================================

    #[test]
    fn test_width8_set_shift_get_scenario() {
        let service = CacheService::new(CAPACITY);
        let all: Vec<i64> = (0..8192).collect();
        let first_ten: Vec<i64> = (0..10).collect();

        let first = service.dispatch(request(8, Operator::Set, all.clone())).unwrap();
        assert_eq!(first.ids.len(), 8192);
        assert_eq!(first.ids, all);

        let second = service.dispatch(request(8, Operator::Set, all)).unwrap();
        assert!(second.ids.is_empty());

        service.dispatch(request(8, Operator::Shift, vec![])).unwrap();

        let after_shift = service
            .dispatch(request(8, Operator::Get, first_ten.clone()))
            .unwrap();
        assert_eq!(after_shift.ids, first_ten);
        assert_eq!(after_shift.flags, vec![2; 10]);

        service
            .dispatch(request(8, Operator::Set, first_ten.clone()))
            .unwrap();
        let remarked = service.dispatch(request(8, Operator::Get, first_ten)).unwrap();
        assert_eq!(remarked.flags, vec![3; 10]);
    }

    #[test]
    fn test_width2_history_scenario() {
        let service = CacheService::new(CAPACITY);

        service.dispatch(request(2, Operator::Set, vec![5])).unwrap();
        let flags = service.dispatch(request(2, Operator::Get, vec![5])).unwrap();
        assert_eq!(flags.flags, vec![1]);

        service.dispatch(request(2, Operator::Shift, vec![])).unwrap();
        let marked = service.dispatch(request(2, Operator::Set, vec![5])).unwrap();
        assert_eq!(marked.ids, vec![5]);

        let flags = service.dispatch(request(2, Operator::Get, vec![5])).unwrap();
        assert_eq!(flags.flags, vec![3]);
    }

    // ============================================================
    // OPERATOR CONTRACTS
    // ============================================================

    #[test]
    fn test_set_returns_only_newly_marked_in_order() {
        let service = CacheService::new(CAPACITY);
        service.dispatch(request(4, Operator::Set, vec![2, 4])).unwrap();

        let response = service
            .dispatch(request(4, Operator::Set, vec![9, 2, 1, 4, 9]))
            .unwrap();

        assert_eq!(response.ids, vec![9, 1]);
        assert!(response.flags.is_empty());
    }

    #[test]
    fn test_sync_merges_with_or() {
        let service = CacheService::new(CAPACITY);
        service.dispatch(request(16, Operator::Set, vec![1, 2])).unwrap();

        let sync = request(16, Operator::Sync, vec![1, 3]).with_flags(vec![0b100, 0b110]);
        let response = service.dispatch(sync.clone()).unwrap();
        assert!(response.ids.is_empty() && response.flags.is_empty());

        // Applying the same merge twice changes nothing.
        service.dispatch(sync).unwrap();

        let read = service
            .dispatch(request(16, Operator::Get, vec![1, 2, 3]))
            .unwrap();
        assert_eq!(read.flags, vec![0b101, 0b001, 0b110]);
        assert_eq!(service.info()[0].occupancy, 3);
    }

    #[test]
    fn test_get_on_fresh_cache_returns_zeroes() {
        let service = CacheService::new(CAPACITY);

        let read = service
            .dispatch(request(64, Operator::Get, vec![0, 1, 2]))
            .unwrap();

        assert_eq!(read.flags, vec![0, 0, 0]);
        assert_eq!(service.info()[0].occupancy, 0);
    }

    #[test]
    fn test_info_does_not_create_or_mutate() {
        let service = CacheService::new(CAPACITY);
        service.dispatch(request(8, Operator::Set, vec![1])).unwrap();

        let info = CacheRequest::new(8, "other", Operator::Info);
        let response = service.dispatch(info).unwrap();

        assert_eq!(response, Default::default());
        assert_eq!(service.cache_list().len(), 1);
        assert_eq!(service.info()[0].occupancy, 1);
    }

    #[test]
    fn test_legacy_info_spelling_is_accepted() {
        let service = CacheService::new(CAPACITY);
        let mut legacy = CacheRequest::new(8, "UidTest", Operator::Info);
        legacy.operator = "INFOMATION".to_string();

        assert!(service.dispatch(legacy).is_ok());
    }

    // ============================================================
    // VALIDATION
    // ============================================================

    #[test]
    fn test_unknown_operator_is_rejected() {
        let service = CacheService::new(CAPACITY);
        let mut bad = request(8, Operator::Set, vec![1]);
        bad.operator = "DELETE".to_string();

        let result = service.dispatch(bad);

        assert_eq!(result, Err(CacheError::UnknownOperator("DELETE".to_string())));
        assert!(service.cache_list().is_empty());
    }

    #[test]
    fn test_unsupported_width_is_rejected() {
        let service = CacheService::new(CAPACITY);

        let result = service.dispatch(request(3, Operator::Set, vec![1]));

        assert_eq!(result, Err(CacheError::UnsupportedWidth(3)));
        assert!(service.cache_list().is_empty());
    }

    #[test]
    fn test_width_mismatch_is_rejected_without_mutation() {
        let service = CacheService::new(CAPACITY);
        service.dispatch(request(8, Operator::Set, vec![1])).unwrap();

        let result = service.dispatch(request(16, Operator::Set, vec![2]));
        assert!(matches!(result, Err(CacheError::WidthMismatch { .. })));

        let info = CacheRequest::new(32, "UidTest", Operator::Info);
        assert!(matches!(
            service.dispatch(info),
            Err(CacheError::WidthMismatch { .. })
        ));

        let read = service.dispatch(request(8, Operator::Get, vec![2])).unwrap();
        assert_eq!(read.flags, vec![0]);
    }

    #[test]
    fn test_sync_length_mismatch_fails_before_writes() {
        let service = CacheService::new(CAPACITY);

        let bad = request(8, Operator::Sync, vec![1, 2, 3]).with_flags(vec![1, 1]);
        let result = service.dispatch(bad);

        assert_eq!(result, Err(CacheError::LengthMismatch { ids: 3, flags: 2 }));
        assert!(service.cache_list().is_empty());
    }

    // ============================================================
    // RANGE HANDLING
    // ============================================================

    #[test]
    fn test_out_of_range_ids_are_skipped() {
        let service = CacheService::new(CAPACITY);
        let max = CAPACITY as i64 - 1;

        let set = service
            .dispatch(request(1, Operator::Set, vec![-1, 0, max, max + 1]))
            .unwrap();
        assert_eq!(set.ids, vec![0, max]);

        let get = service
            .dispatch(request(1, Operator::Get, vec![max + 1, max, -5]))
            .unwrap();
        assert_eq!(get.ids, vec![max]);
        assert_eq!(get.flags, vec![1]);

        let sync = request(1, Operator::Sync, vec![max + 10, 7]).with_flags(vec![1, 1]);
        service.dispatch(sync).unwrap();

        let info = &service.info()[0];
        assert_eq!(info.occupancy, 3);
        assert_eq!(info.max_seen_id, max as u64);
    }

    #[tokio::test]
    async fn test_concurrent_sets_are_serialized() {
        let service = CacheService::new(CAPACITY);
        let mut handles = Vec::new();

        for worker in 0..8i64 {
            let service = Arc::clone(&service);
            handles.push(tokio::task::spawn_blocking(move || {
                // Every worker marks the same ids; each id is new exactly once.
                let ids: Vec<i64> = (0..1000).map(|i| (i * 7 + worker) % 1000).collect();
                service
                    .dispatch(request(4, Operator::Set, ids))
                    .unwrap()
                    .ids
                    .len()
            }));
        }

        let mut newly_marked = 0;
        for handle in handles {
            newly_marked += handle.await.unwrap();
        }

        assert_eq!(newly_marked, 1000);
        assert_eq!(service.info()[0].occupancy, 1000);
    }

    // ============================================================
    // FAULT BOUNDARY
    // ============================================================

    #[tokio::test]
    async fn test_panicking_request_is_internal_error_and_node_keeps_serving() {
        let service = CacheService::new(CAPACITY);

        let crashed: Result<CacheResponse, CacheError> =
            run_blocking("Request SHIFT on 'UidTest'", || panic!("counter buffer corrupted")).await;

        let error = crashed.unwrap_err();
        assert!(matches!(error, CacheError::Internal(_)));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(body.error.contains("panicked"), "unexpected error: {}", body.error);

        let Json(marked) = handle_request(
            Extension(Arc::clone(&service)),
            Ok(Json(request(8, Operator::Set, vec![1, 2]))),
        )
        .await
        .unwrap();
        assert_eq!(marked.ids, vec![1, 2]);
        assert_eq!(service.info()[0].occupancy, 2);
    }

    #[tokio::test]
    async fn test_handler_maps_dispatch_errors_to_bad_request() {
        let service = CacheService::new(CAPACITY);
        let mut bad = request(8, Operator::Get, vec![1]);
        bad.width = -1;

        let error = handle_request(Extension(Arc::clone(&service)), Ok(Json(bad)))
            .await
            .unwrap_err();

        assert_eq!(error, CacheError::UnsupportedWidth(-1));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(service.info().is_empty());
    }
}
