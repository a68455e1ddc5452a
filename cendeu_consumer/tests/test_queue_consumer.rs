use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cendeu_consumer::{ConsumerOptions, QueueConsumer, run_consumer_pool};
use cendeu_core::{Cuit, DebtorUpdate, DebtorUpdateBatch};
use cendeu_queue::{InMemoryQueue, MessageQueue, QueueOptions};
use cendeu_store::{DebtorStore, InMemoryDebtorStore};

fn test_options() -> ConsumerOptions {
    ConsumerOptions {
        max_messages: 10,
        wait: Duration::ZERO,
        workers: 1,
    }
}

fn create_consumer() -> (QueueConsumer, Arc<InMemoryQueue>, Arc<InMemoryDebtorStore>) {
    let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
    let debtors: Arc<InMemoryDebtorStore> = InMemoryDebtorStore::new().into();
    let consumer = QueueConsumer::new(queue.clone(), debtors.clone(), test_options());
    (consumer, queue, debtors)
}

fn update(cuit: &str, situacion: u8, monto: u64, run_id: &str, line: u64) -> DebtorUpdate {
    DebtorUpdate {
        cuit: cuit.to_string(),
        situacion,
        monto,
        codigo_entidad: "00007".to_string(),
        fecha_informacion: "202311".to_string(),
        tipo_identificacion: "12".to_string(),
        actividad: "001".to_string(),
        importacion_id: run_id.to_string(),
        linea_archivo: line,
    }
}

fn batch_body(deudores: Vec<DebtorUpdate>) -> String {
    serde_json::to_string(&DebtorUpdateBatch { deudores }).expect("encode batch")
}

#[tokio::test]
async fn test_batch_is_applied_and_acknowledged() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish(batch_body(vec![
            update("20003905528", 3, 100, "run-1", 1),
            update("20003905528", 5, 50, "run-1", 2),
            update("27123456789", 1, 7, "run-1", 3),
        ]))
        .await
        .expect("publish");

    let handled = consumer.poll_once().await.expect("poll");
    assert_eq!(1, handled);

    let aggregate = debtors
        .get(&Cuit::new_unchecked("20003905528"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(5, aggregate.max_severity);
    assert_eq!(150, aggregate.total_loan_amount);

    let other = debtors
        .get(&Cuit::new_unchecked("27123456789"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(1, other.max_severity);
    assert_eq!(7, other.total_loan_amount);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_oversized_amount_saturates_the_aggregate() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish(batch_body(vec![
            update("20003905528", 1, u64::MAX, "run-1", 1),
            update("20003905528", 1, 2, "run-1", 2),
        ]))
        .await
        .expect("publish");

    let handled = consumer.poll_once().await.expect("poll");
    assert_eq!(1, handled);

    let aggregate = debtors
        .get(&Cuit::new_unchecked("20003905528"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(u64::MAX, aggregate.total_loan_amount);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_duplicate_delivery_is_not_double_counted() {
    let (consumer, queue, debtors) = create_consumer();
    let body = batch_body(vec![update("20003905528", 3, 100, "run-1", 1)]);

    queue.publish(body.clone()).await.expect("publish");
    consumer.poll_once().await.expect("poll");

    // The same event arriving again must hit the idempotency key.
    queue.publish(body).await.expect("publish");
    consumer.poll_once().await.expect("poll");

    let aggregate = debtors
        .get(&Cuit::new_unchecked("20003905528"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(100, aggregate.total_loan_amount);
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_redelivered_batch_applies_exactly_once() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish(batch_body(vec![update("20003905528", 3, 100, "run-1", 1)]))
        .await
        .expect("publish");

    // Deliver once without acknowledging, as a crashed worker would.
    let dropped = queue.receive(10, Duration::ZERO).await.expect("receive");
    assert_eq!(1, dropped.len());
    drop(dropped);

    tokio::time::advance(Duration::from_secs(301)).await;

    let handled = consumer.poll_once().await.expect("poll");
    assert_eq!(1, handled);

    let aggregate = debtors
        .get(&Cuit::new_unchecked("20003905528"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(100, aggregate.total_loan_amount);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_poison_message_is_dropped() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish("definitely not json".to_string())
        .await
        .expect("publish");

    let handled = consumer.poll_once().await.expect("poll");
    assert_eq!(1, handled);

    assert!(queue.is_empty());
    assert_eq!(0, debtors.len().await.expect("len"));
}

#[tokio::test]
async fn test_invalid_update_is_skipped_but_valid_ones_apply() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish(batch_body(vec![
            update("123", 3, 100, "run-1", 1),
            update("27123456789", 2, 40, "run-1", 2),
        ]))
        .await
        .expect("publish");

    consumer.poll_once().await.expect("poll");

    assert_eq!(1, debtors.len().await.expect("len"));
    let aggregate = debtors
        .get(&Cuit::new_unchecked("27123456789"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(40, aggregate.total_loan_amount);
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_store_outage_leaves_message_for_redelivery() {
    let (consumer, queue, debtors) = create_consumer();

    queue
        .publish(batch_body(vec![update("20003905528", 3, 100, "run-1", 1)]))
        .await
        .expect("publish");

    debtors.set_unavailable(true);
    let handled = consumer.poll_once().await.expect("poll");
    assert_eq!(1, handled);
    assert_eq!(1, queue.len());

    debtors.set_unavailable(false);
    tokio::time::advance(Duration::from_secs(301)).await;
    consumer.poll_once().await.expect("poll");

    let aggregate = debtors
        .get(&Cuit::new_unchecked("20003905528"))
        .await
        .expect("get")
        .expect("aggregate exists");
    assert_eq!(100, aggregate.total_loan_amount);
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pool_drains_queue_and_stops_on_cancellation() {
    let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
    let debtors: Arc<InMemoryDebtorStore> = InMemoryDebtorStore::new().into();

    queue
        .publish(batch_body(vec![update("20003905528", 3, 100, "run-1", 1)]))
        .await
        .expect("publish");

    let ct = CancellationToken::new();
    let pool = tokio::spawn(run_consumer_pool(
        queue.clone(),
        debtors.clone(),
        ConsumerOptions {
            workers: 2,
            ..ConsumerOptions::default()
        },
        ct.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(1)).await;

    ct.cancel();
    pool.await.expect("pool join");

    assert!(queue.is_empty());
    assert_eq!(1, debtors.len().await.expect("len"));
}
