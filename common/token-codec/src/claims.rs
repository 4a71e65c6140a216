use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};

pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_ISSUER: &str = "iss";
pub const CLAIM_EXPIRY: &str = "exp";

/// Claims carried in a token payload. Keys other than `sub`, `iss` and `exp`
/// are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert any serializable value into claims. It must serialize to a JSON object.
    pub fn from_serializable<T>(value: &T) -> CodecResult<Self>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CodecError::Encoding(format!(
                "claims must serialize to a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Deserialize the claims into an application type.
    pub fn deserialize<T>(&self) -> CodecResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|err| CodecError::InvalidClaim("claims", err.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with(CLAIM_SUBJECT, Value::String(subject.into()))
    }

    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with(CLAIM_ISSUER, Value::String(issuer.into()))
    }

    /// Set `exp` to the whole second of `at`.
    pub fn with_expiry(self, at: DateTime<Utc>) -> Self {
        self.with(CLAIM_EXPIRY, at.timestamp())
    }

    /// Set `exp` to a raw, possibly fractional, Unix timestamp. Non-finite
    /// values are stored as `null` and rejected at encode time.
    pub fn with_expiry_timestamp(self, exp: f64) -> Self {
        self.with(CLAIM_EXPIRY, exp)
    }

    /// Set `exp` to `ttl` from now. A result outside the representable range
    /// stores `null`, which encode rejects.
    pub fn expires_in(self, ttl: Duration) -> Self {
        match Utc::now().checked_add_signed(ttl) {
            Some(at) => self.with_expiry(at),
            None => self.with(CLAIM_EXPIRY, Value::Null),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(CLAIM_SUBJECT).and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get(CLAIM_ISSUER).and_then(Value::as_str)
    }

    /// `exp` as Unix seconds, when present and numeric.
    pub fn expiry(&self) -> Option<f64> {
        self.get(CLAIM_EXPIRY)
            .and_then(Value::as_f64)
            .filter(|exp| exp.is_finite())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.expiry()?;
        let secs = exp.floor();
        let nanos = ((exp - secs) * 1e9) as u32;
        if secs < i64::MIN as f64 || secs >= i64::MAX as f64 {
            return None;
        }
        Utc.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
    }

    /// Whether `exp` is at or before `now`, allowing `leeway_seconds` of skew.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: u32) -> CodecResult<bool> {
        let exp = self.require_expiry()?;
        Ok(exp <= unix_seconds(now) - f64::from(leeway_seconds))
    }

    pub(crate) fn require_expiry(&self) -> CodecResult<f64> {
        match self.get(CLAIM_EXPIRY) {
            None => Err(CodecError::InvalidClaim(CLAIM_EXPIRY, "claim is missing".into())),
            Some(value) => value
                .as_f64()
                .filter(|exp| exp.is_finite())
                .ok_or_else(|| {
                    CodecError::InvalidClaim(
                        CLAIM_EXPIRY,
                        format!("expected a numeric timestamp, got {}", json_kind(value)),
                    )
                }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl TryFrom<Value> for Claims {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CodecError::MalformedToken(format!(
                "claims segment must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

pub(crate) fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1e9
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct WorkloadClaims {
        sub: String,
        iss: String,
        exp: i64,
    }

    fn workload_claims(exp: i64) -> Claims {
        Claims::new()
            .with_subject("workload-123")
            .with_issuer("aembit-edge")
            .with(CLAIM_EXPIRY, exp)
    }

    #[test]
    fn typed_accessors_read_registered_claims() {
        let claims = workload_claims(1_700_000_000);
        assert_eq!(claims.subject(), Some("workload-123"));
        assert_eq!(claims.issuer(), Some("aembit-edge"));
        assert_eq!(claims.expiry(), Some(1_700_000_000.0));
        assert_eq!(
            claims.expires_at(),
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
    }

    #[test]
    fn fractional_expiry_keeps_subsecond_precision() {
        let claims = Claims::new().with_expiry_timestamp(1_700_000_000.25);
        let at = claims.expires_at().expect("valid timestamp");
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert_eq!(at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("time");
        assert!(workload_claims(1_700_000_000).is_expired_at(now, 0).expect("numeric"));
        assert!(!workload_claims(1_700_000_001).is_expired_at(now, 0).expect("numeric"));
        assert!(!workload_claims(1_700_000_000).is_expired_at(now, 1).expect("numeric"));
    }

    #[test]
    fn non_numeric_expiry_is_an_invalid_claim() {
        let claims = Claims::new().with(CLAIM_EXPIRY, "tomorrow");
        assert_eq!(claims.expiry(), None);
        match claims.require_expiry() {
            Err(CodecError::InvalidClaim("exp", detail)) => assert!(detail.contains("string")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            Claims::new().require_expiry(),
            Err(CodecError::InvalidClaim("exp", _))
        ));
        assert_eq!(Claims::new().with_expiry_timestamp(f64::NAN).get("exp"), Some(&Value::Null));
    }

    #[test]
    fn out_of_range_ttl_leaves_expiry_unusable() {
        let claims = Claims::new().with_subject("workload-123").expires_in(Duration::MAX);
        assert_eq!(claims.get(CLAIM_EXPIRY), Some(&Value::Null));
        assert_eq!(claims.expiry(), None);

        let soon = Claims::new().expires_in(Duration::minutes(5));
        let exp = soon.expiry().expect("numeric exp");
        assert!(exp > unix_seconds(Utc::now()));
    }

    #[test]
    fn typed_round_trip_through_serde() {
        let typed = WorkloadClaims {
            sub: "workload-123".into(),
            iss: "aembit-edge".into(),
            exp: 42,
        };
        let claims = Claims::from_serializable(&typed).expect("object");
        assert_eq!(claims, workload_claims(42));
        let back: WorkloadClaims = claims.deserialize().expect("deserialize");
        assert_eq!(back, typed);
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(matches!(
            Claims::from_serializable(&vec![1, 2, 3]),
            Err(CodecError::Encoding(_))
        ));
        assert!(matches!(
            Claims::try_from(json!("just a string")),
            Err(CodecError::MalformedToken(_))
        ));
        let claims = Claims::try_from(json!({"sub": "a", "scope": ["read"]})).expect("object");
        assert_eq!(claims.len(), 2);
        assert_eq!(claims.get("scope"), Some(&json!(["read"])));
    }
}
