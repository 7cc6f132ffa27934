#[cfg(feature = "lambda")]
use iot_ingest::adapters::dynamodb::DynamoDbSink;
#[cfg(feature = "lambda")]
use iot_ingest::core::kinesis_handler::HandlerResponse;
#[cfg(feature = "lambda")]
use iot_ingest::utils::logger;
#[cfg(feature = "lambda")]
use iot_ingest::{KinesisEvent, KinesisHandler, LambdaConfig};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[cfg(feature = "lambda")]
async fn function_handler(
    handler: &KinesisHandler<DynamoDbSink>,
    event: LambdaEvent<KinesisEvent>,
) -> Result<HandlerResponse, Error> {
    tracing::info!(
        "Received {} Kinesis records (request {})",
        event.payload.records.len(),
        event.context.request_id
    );

    let response = handler
        .handle(&event.payload)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時建立一次，之後每次呼叫共用
    let config = LambdaConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    let sink = DynamoDbSink::connect(config.table_name.clone(), config.region.clone()).await;
    let handler = KinesisHandler::new(sink);
    tracing::info!("Writing to DynamoDB table {}", config.table_name);

    let handler = &handler;
    run(service_fn(move |event: LambdaEvent<KinesisEvent>| async move {
        function_handler(handler, event).await
    }))
    .await
}
