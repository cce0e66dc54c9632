// services/tx/confirm/poller.rs

use crate::errors::error::{AppError, Result};
use crate::infrastructure::provider::ProviderTrait;
use crate::models::Receipt;
use crate::{log_debug, log_info, log_warn};
use ethers_core::types::H256;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;

/// 轮询间隔下限，更小的值会被提升到该值
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Confirmed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending)
    }
}

/// 等待回执的状态机：Pending → Confirmed | TimedOut | Cancelled，终态不可回退。
///
/// 截止时间在构造时确定。第一次查询发生在构造后一个间隔；
/// 取消和超时只在 tick 之间检查，进行中的查询不会被打断。
/// "Confirmed" 只表示回执已存在，不代表达到任何确认深度。
pub struct ConfirmationPoller {
    provider: Arc<dyn ProviderTrait>,
    tx_hash: H256,
    interval: Duration,
    timeout: Duration,
    started: Instant,
    deadline: Instant,
    state: PollState,
}

impl ConfirmationPoller {
    pub fn new(
        provider: Arc<dyn ProviderTrait>,
        tx_hash: H256,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        let started = Instant::now();
        Self {
            provider,
            tx_hash,
            interval: interval.max(MIN_POLL_INTERVAL),
            timeout,
            started,
            deadline: started + timeout,
            state: PollState::Pending,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<Receipt> {
        if self.state.is_terminal() {
            return Err(AppError::PollerFinished(format!(
                "{:#x} 已是 {:?}",
                self.tx_hash, self.state
            )));
        }

        let mut ticker = interval_at(self.started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = sleep_until(self.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.state = PollState::Cancelled;
                    log_warn!("停止等待交易 {:#x}：调用方取消", self.tx_hash);
                    return Err(AppError::ConfirmationCancelled { tx_hash: self.tx_hash });
                }
                _ = &mut deadline => {
                    self.state = PollState::TimedOut;
                    log_warn!("等待交易 {:#x} 超时（{:?}）", self.tx_hash, self.timeout);
                    return Err(AppError::ConfirmationTimeout {
                        tx_hash: self.tx_hash,
                        timeout: self.timeout,
                    });
                }
                _ = ticker.tick() => {
                    if let Some(receipt) = self.poll_once().await {
                        self.state = PollState::Confirmed;
                        log_info!(
                            "交易 {:#x} 已打包: 区块 {} 状态 {:?} gas_used {}",
                            self.tx_hash,
                            receipt.block_number,
                            receipt.status,
                            receipt.gas_used
                        );
                        return Ok(receipt);
                    }
                }
            }
        }
    }

    /// 单次查询；查询失败只记录日志，继续等下一个 tick
    async fn poll_once(&self) -> Option<Receipt> {
        match self.provider.get_transaction_receipt(self.tx_hash).await {
            Ok(Some(raw)) => match Receipt::try_from(raw) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    log_debug!("回执 {:#x} 尚不完整: {}", self.tx_hash, e);
                    None
                }
            },
            Ok(None) => {
                log_debug!("交易 {:#x} 回执未找到，继续等待", self.tx_hash);
                None
            }
            Err(e) => {
                log_warn!("查询交易 {:#x} 回执失败: {}", self.tx_hash, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::provider::mock::StubProvider;
    use std::sync::atomic::Ordering;

    fn poller(stub: &Arc<StubProvider>, interval_ms: u64, timeout_ms: u64) -> ConfirmationPoller {
        ConfirmationPoller::new(
            stub.clone(),
            H256::repeat_byte(0x11),
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_only_on_nth_tick() {
        let stub = Arc::new(StubProvider::new().with_receipt_after(3));
        let mut p = poller(&stub, 1_000, 60_000);
        let start = Instant::now();

        let receipt = p.wait(&CancellationToken::new()).await.unwrap();

        assert_eq!(receipt.tx_hash, H256::repeat_byte(0x11));
        assert!(receipt.is_success());
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
        assert_eq!(p.state(), PollState::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_before_first_tick_times_out() {
        let stub = Arc::new(StubProvider::new().with_receipt_after(1));
        let mut p = poller(&stub, 1_000, 500);

        let err = p.wait(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, AppError::ConfirmationTimeout { .. }));
        assert_eq!(p.state(), PollState::TimedOut);
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_polling() {
        let stub = Arc::new(StubProvider::new());
        let mut p = poller(&stub, 1_000, 3_500);

        let err = p.wait(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, AppError::ConfirmationTimeout { timeout, .. } if timeout == Duration::from_millis(3_500)));
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_is_clamped_to_floor() {
        let stub = Arc::new(StubProvider::new().with_receipt_after(2));
        let mut p = poller(&stub, 100, 60_000);
        assert_eq!(p.interval(), MIN_POLL_INTERVAL);

        let start = Instant::now();
        p.wait(&CancellationToken::new()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let stub = Arc::new(StubProvider::new());
        let mut p = poller(&stub, 1_000, 60_000);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            trigger.cancel();
        });

        let err = p.wait(&token).await.unwrap_err();

        assert!(matches!(err, AppError::ConfirmationCancelled { .. }));
        assert_eq!(p.state(), PollState::Cancelled);
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn query_errors_keep_polling_until_deadline() {
        let stub = Arc::new(StubProvider::new().failing("receipt"));
        let mut p = poller(&stub, 1_000, 2_500);

        let err = p.wait(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, AppError::ConfirmationTimeout { .. }));
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_state_is_final() {
        let stub = Arc::new(StubProvider::new().with_receipt_after(1));
        let mut p = poller(&stub, 1_000, 10_000);
        p.wait(&CancellationToken::new()).await.unwrap();

        assert!(matches!(
            p.wait(&CancellationToken::new()).await,
            Err(AppError::PollerFinished(_))
        ));
        assert_eq!(p.state(), PollState::Confirmed);
        assert_eq!(stub.receipt_calls.load(Ordering::SeqCst), 1);
    }
}
