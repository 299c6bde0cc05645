//! 트레이딩 시스템의 에러 타입.
//!
//! 이 모듈은 트레이딩 시스템 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 거래소 연결 에러
    #[error("거래소 에러: {0}")]
    Exchange(String),

    /// 주문 에러
    #[error("주문 에러: {0}")]
    Order(String),

    /// 포지션 에러
    #[error("포지션 에러: {0}")]
    Position(String),

    /// 리스크 관리 에러
    #[error("리스크 에러: {0}")]
    Risk(String),

    /// 전략 에러
    #[error("전략 에러: {0}")]
    Strategy(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 인증 에러
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimit(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 잔고 부족
    #[error("잔고 부족: {0}")]
    InsufficientFunds(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 거래소가 200 OK에 에러 페이로드를 담아 거절한 경우
    #[error("거래소 거절 [{venue}] code={code}: {message}")]
    VenueRejection {
        venue: String,
        code: String,
        message: String,
    },

    /// 사이징 결과가 거래소 최소 주문 금액 미만이거나 0 이하
    #[error("사이징 불가: {0}")]
    SizingInfeasible(String),

    /// 소수 변환 중 NaN/Inf를 만나 시트 구성에 실패
    #[error("정밀도/변환 에러: {0}")]
    Precision(String),

    /// 시그널 엔진 기동 시 두 다리의 지갑 보유 상태가 불일치
    #[error("정합성 위반: {0}")]
    Consistency(String),

    /// 캐시(Redis) 에러
    #[error("캐시 에러: {0}")]
    Cache(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

impl TraderError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TraderError::Network(_) | TraderError::RateLimit(_)
        )
    }

    /// 치명적인 에러인지 확인합니다.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            TraderError::Auth(_) | TraderError::InsufficientFunds(_)
        )
    }

    /// 프로세스를 즉시 종료해야 하는 에러인지 확인합니다 (readiness-stall,
    /// eject 이후의 정합성 위반 등). `is_critical`과 달리 이 플랫폼의
    /// 치명적 종료 정책(readiness-stall, Consistency, Config)을 반영한다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TraderError::Consistency(_) | TraderError::Config(_) | TraderError::Auth(_)
        )
    }
}

impl From<serde_json::Error> for TraderError {
    fn from(err: serde_json::Error) -> Self {
        TraderError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let network_err = TraderError::Network("timeout".to_string());
        assert!(network_err.is_retryable());

        let auth_err = TraderError::Auth("invalid key".to_string());
        assert!(!auth_err.is_retryable());
    }

    #[test]
    fn test_error_critical() {
        let auth_err = TraderError::Auth("invalid key".to_string());
        assert!(auth_err.is_critical());

        let order_err = TraderError::Order("invalid quantity".to_string());
        assert!(!order_err.is_critical());
    }

    #[test]
    fn test_error_fatal() {
        let consistency_err = TraderError::Consistency("wallet mismatch".to_string());
        assert!(consistency_err.is_fatal());

        let sizing_err = TraderError::SizingInfeasible("below minimum notional".to_string());
        assert!(!sizing_err.is_fatal());
    }
}
