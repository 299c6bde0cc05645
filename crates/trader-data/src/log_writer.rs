//! 체결/프리미엄 로그 기록.
//!
//! 용량 100짜리 버퍼 채널 두 개. 전담 태스크가 채널을 읽어 100개를
//! 모으면 복사본을 분리된 태스크로 넘겨 단일 트랜잭션으로 삽입하고
//! 성공/실패를 로그한다. 메인 태스크는 계속 적재하며, 느려지면
//! 프로듀서 채널이 가득 차 드롭된다 — 최선 노력(best-effort) 정책이다.

use tokio::sync::mpsc;
use tracing::{error, warn};
use trader_core::{KimchiOrderLog, PremiumLog};

use crate::storage::{KimchiOrderLogRepository, PremiumLogRepository};

const CHANNEL_CAPACITY: usize = 100;
const BATCH_SIZE: usize = 100;

/// 두 로그 채널의 생산자 측 핸들.
#[derive(Clone)]
pub struct LogWriterHandle {
    order_tx: mpsc::Sender<KimchiOrderLog>,
    premium_tx: mpsc::Sender<PremiumLog>,
}

impl LogWriterHandle {
    /// 논블로킹 전송. 채널이 가득 차면 그 행은 버려지고 경고 로그만 남는다.
    pub fn push_order_log(&self, row: KimchiOrderLog) {
        if self.order_tx.try_send(row).is_err() {
            warn!("kimchi order log channel full, dropping row");
        }
    }

    pub fn push_premium_log(&self, row: PremiumLog) {
        if self.premium_tx.try_send(row).is_err() {
            warn!("premium log channel full, dropping row");
        }
    }
}

/// 로그 라이터를 생성하고, 소비 태스크 두 개(주문 로그/프리미엄 로그)를
/// 돌릴 수 있는 퓨처와 함께 핸들을 반환한다.
pub fn spawn(
    order_repo: KimchiOrderLogRepository,
    premium_repo: PremiumLogRepository,
) -> (LogWriterHandle, impl std::future::Future<Output = ()>) {
    let (order_tx, order_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (premium_tx, premium_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = LogWriterHandle {
        order_tx,
        premium_tx,
    };

    let driver = async move {
        tokio::join!(
            run_order_log_loop(order_rx, order_repo),
            run_premium_log_loop(premium_rx, premium_repo),
        );
    };

    (handle, driver)
}

/// `signal` 프로세스용: 프리미엄 로그 채널 하나만 돌린다. 이 프로세스는
/// 계좌 상태에 손대지 않으므로 주문 로그 레포지토리를 들고 있을 이유가
/// 없다.
pub fn spawn_premium_only(
    premium_repo: PremiumLogRepository,
) -> (mpsc::Sender<PremiumLog>, impl std::future::Future<Output = ()>) {
    let (premium_tx, premium_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let driver = run_premium_log_loop(premium_rx, premium_repo);
    (premium_tx, driver)
}

async fn run_order_log_loop(
    mut rx: mpsc::Receiver<KimchiOrderLog>,
    repo: KimchiOrderLogRepository,
) {
    let mut buffer = Vec::with_capacity(BATCH_SIZE);

    while let Some(row) = rx.recv().await {
        buffer.push(row);
        if buffer.len() >= BATCH_SIZE {
            let batch = std::mem::replace(&mut buffer, Vec::with_capacity(BATCH_SIZE));
            flush_order_log(repo.clone(), batch);
        }
    }
}

async fn run_premium_log_loop(mut rx: mpsc::Receiver<PremiumLog>, repo: PremiumLogRepository) {
    let mut buffer = Vec::with_capacity(BATCH_SIZE);

    while let Some(row) = rx.recv().await {
        buffer.push(row);
        if buffer.len() >= BATCH_SIZE {
            let batch = std::mem::replace(&mut buffer, Vec::with_capacity(BATCH_SIZE));
            flush_premium_log(repo.clone(), batch);
        }
    }
}

fn flush_order_log(repo: KimchiOrderLogRepository, batch: Vec<KimchiOrderLog>) {
    tokio::spawn(async move {
        match repo.insert_batch(&batch).await {
            Ok(n) => tracing::debug!(rows = n, "flushed kimchi order log batch"),
            Err(e) => error!("failed to flush kimchi order log batch: {e}"),
        }
    });
}

fn flush_premium_log(repo: PremiumLogRepository, batch: Vec<PremiumLog>) {
    tokio::spawn(async move {
        match repo.insert_batch(&batch).await {
            Ok(n) => tracing::debug!(rows = n, "flushed premium log batch"),
            Err(e) => error!("failed to flush premium log batch: {e}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CHANNEL_CAPACITY, 100);
        assert_eq!(BATCH_SIZE, 100);
    }
}
