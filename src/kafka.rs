use crate::config::AppConfig;
use crate::feed::ChangeStream;
use crate::models::change::{ChangeEvent, ChangeKind};
use crate::processor::change_decoder;
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Debezium topic carrying the changes of `table` in the public schema.
pub fn cdc_topic(prefix: &str, table: &str) -> String {
    format!("{}.public.{}", prefix, table)
}

/// Change stream backed by a Debezium CDC topic, with SASL/SCRAM
/// authentication and a circuit breaker on consecutive receive errors.
pub struct KafkaChangeStream {
    config: AppConfig,
    consumer: Option<Arc<StreamConsumer>>,
}

impl KafkaChangeStream {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            consumer: None,
        }
    }

    fn create_consumer(&self) -> anyhow::Result<StreamConsumer> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.config.kafka_bootstrap_servers)
            .set("group.id", &self.config.kafka_group_id)
            .set("auto.offset.reset", &self.config.kafka_auto_offset_reset)
            // SASL Configuration
            .set("security.protocol", &self.config.kafka_security_protocol)
            .set("sasl.mechanism", &self.config.kafka_sasl_mechanism)
            .set("sasl.username", &self.config.kafka_username)
            .set("sasl.password", &self.config.kafka_password);

        Ok(client_config.create()?)
    }
}

struct Breaker {
    consumer: Arc<StreamConsumer>,
    consecutive_failures: u32,
    max_retries: u32,
    cooldown: Duration,
    kinds: Vec<ChangeKind>,
}

impl Breaker {
    /// Waits for the next decodable event of a wanted kind.
    async fn next_event(&mut self) -> ChangeEvent {
        loop {
            // Circuit Breaker Check
            if self.consecutive_failures >= self.max_retries {
                warn!(
                    "Circuit breaker tripped ({} consecutive failures)! Sleeping for {} seconds...",
                    self.consecutive_failures,
                    self.cooldown.as_secs()
                );
                tokio::time::sleep(self.cooldown).await;
                self.consecutive_failures = 0;
                info!("Circuit breaker reset. Resuming consumption.");
            }

            // The borrowed message must not outlive this statement.
            let received = match self.consumer.recv().await {
                Ok(m) => Ok(match m.payload() {
                    None => {
                        debug!("Tombstone at offset {}, skipping", m.offset());
                        None
                    }
                    Some(payload) => change_decoder::decode_change(payload),
                }),
                Err(e) => Err(e),
            };

            match received {
                Ok(decoded) => {
                    self.consecutive_failures = 0;

                    match decoded {
                        Some(event) if self.kinds.contains(&event.kind) => return event,
                        _ => continue,
                    }
                }
                Err(e) => {
                    error!(
                        "Kafka error: {}. Incrementing failure count ({} / {})",
                        e,
                        self.consecutive_failures + 1,
                        self.max_retries
                    );
                    self.consecutive_failures += 1;

                    // Small delay to prevent tight loop in case of minor network glitches
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }
}

#[async_trait]
impl ChangeStream for KafkaChangeStream {
    async fn subscribe(
        &mut self,
        table: &str,
        kinds: &[ChangeKind],
    ) -> anyhow::Result<BoxStream<'static, ChangeEvent>> {
        let topic = cdc_topic(&self.config.cdc_topic_prefix, table);
        info!("Initializing Kafka consumer for topic: {}", topic);

        let consumer = Arc::new(self.create_consumer()?);
        consumer
            .subscribe(&[&topic])
            .with_context(|| format!("subscribe to {}", topic))?;
        info!("Subscribed to topic: {}", topic);

        self.consumer = Some(consumer.clone());

        let breaker = Breaker {
            consumer,
            consecutive_failures: 0,
            max_retries: self.config.kafka_max_retries,
            cooldown: Duration::from_secs(self.config.kafka_circuit_breaker_cooldown),
            kinds: kinds.to_vec(),
        };

        Ok(stream::unfold(breaker, |mut breaker| async move {
            let event = breaker.next_event().await;
            Some((event, breaker))
        })
        .boxed())
    }

    async fn unsubscribe(&mut self) -> anyhow::Result<()> {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            info!("Kafka subscription released");
        }
        Ok(())
    }
}
