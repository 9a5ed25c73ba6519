//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError`. Transport failures, throttling and
//! server errors become `Unavailable` because the outcome of the request is
//! unknown. Failed conditions are not errors: they are returned as `false`
//! or as a cancelled transaction.

use std::error::Error;
use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use postboard_core::storage::{StoreError, StoreResult, TransactOutcome};

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError>
where
    E: Error + 'static,
    R: Debug,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            Some(StoreError::Unavailable(
                DisplayErrorContext(err).to_string(),
            ))
        }
        _ => None,
    }
}

fn failed(operation: &str, err: impl Error) -> StoreError {
    StoreError::Failed(format!("{operation} failed: {}", DisplayErrorContext(err)))
}

fn unavailable(reason: &str) -> StoreError {
    StoreError::Unavailable(reason.to_string())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R>(err: SdkError<GetItemError, R>) -> StoreError
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        GetItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        GetItemError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        GetItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => failed("GetItem", err),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R>(err: SdkError<QueryError, R>) -> StoreError
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        QueryError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        QueryError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        QueryError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => failed("Query", err),
    }
}

/// Map a conditional PutItem SDK error; a failed condition is `Ok(false)`.
pub fn map_put_item_error<R>(err: SdkError<PutItemError, R>) -> StoreResult<bool>
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return Err(err);
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => Ok(false),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            Err(unavailable("Throughput exceeded, please retry"))
        }
        PutItemError::RequestLimitExceeded(_) => {
            Err(unavailable("Request limit exceeded, please retry"))
        }
        PutItemError::TransactionConflictException(_) => {
            Err(unavailable("Transaction conflict, please retry"))
        }
        PutItemError::InternalServerError(_) => Err(unavailable("DynamoDB internal server error")),
        err => Err(failed("PutItem", err)),
    }
}

/// Map a conditional DeleteItem SDK error; a failed condition is `Ok(false)`.
pub fn map_delete_item_error<R>(err: SdkError<DeleteItemError, R>) -> StoreResult<bool>
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return Err(err);
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => Ok(false),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            Err(unavailable("Throughput exceeded, please retry"))
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            Err(unavailable("Request limit exceeded, please retry"))
        }
        DeleteItemError::TransactionConflictException(_) => {
            Err(unavailable("Transaction conflict, please retry"))
        }
        DeleteItemError::InternalServerError(_) => {
            Err(unavailable("DynamoDB internal server error"))
        }
        err => Err(failed("DeleteItem", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R>(err: SdkError<UpdateItemError, R>) -> StoreError
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return err;
    }
    match err.into_service_error() {
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            unavailable("Request limit exceeded, please retry")
        }
        UpdateItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        UpdateItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => failed("UpdateItem", err),
    }
}

/// Map a TransactWriteItems SDK error.
///
/// A cancellation caused by failed conditions is `Ok(Cancelled)` with the
/// indices of the failed items; any other cancellation (conflicts with
/// concurrent transactions, throttling) is `Unavailable`.
pub fn map_transact_write_error<R>(
    err: SdkError<TransactWriteItemsError, R>,
) -> StoreResult<TransactOutcome>
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return Err(err);
    }
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => {
            let failed = conditional_failures(
                cancelled
                    .cancellation_reasons()
                    .iter()
                    .map(|reason| reason.code()),
            );
            if failed.is_empty() {
                Err(unavailable("Transaction cancelled, please retry"))
            } else {
                Ok(TransactOutcome::Cancelled { failed })
            }
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            Err(unavailable("Transaction in progress, please retry"))
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            Err(unavailable("Throughput exceeded, please retry"))
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            Err(unavailable("Request limit exceeded, please retry"))
        }
        TransactWriteItemsError::InternalServerError(_) => {
            Err(unavailable("DynamoDB internal server error"))
        }
        err => Err(failed("TransactWriteItems", err)),
    }
}

/// Map a CreateTable SDK error to StoreError.
pub fn map_create_table_error<R>(err: SdkError<CreateTableError, R>) -> StoreError
where
    R: Debug + Send + Sync + 'static,
{
    if let Some(err) = transport_error(&err) {
        return err;
    }
    failed("CreateTable", err.into_service_error())
}

/// Indices of the items whose cancellation reason is a failed condition.
///
/// DynamoDB reports one reason per item, in request order; items that did
/// not cause the cancellation carry the code `None`.
pub fn conditional_failures<'a>(codes: impl Iterator<Item = Option<&'a str>>) -> Vec<usize> {
    codes
        .enumerate()
        .filter(|(_, code)| *code == Some(CONDITIONAL_CHECK_FAILED))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_failures_indices() {
        let codes = [
            Some("None"),
            Some("ConditionalCheckFailed"),
            None,
            Some("ConditionalCheckFailed"),
        ];
        assert_eq!(conditional_failures(codes.into_iter()), vec![1, 3]);
    }

    #[test]
    fn test_conflicts_are_not_conditional_failures() {
        let codes = [Some("TransactionConflict"), Some("None")];
        assert!(conditional_failures(codes.into_iter()).is_empty());
    }
}
