use super::AnswerDigest;

/// Trait for commitment schemes
pub trait CommitmentScheme {
    type Secret: ?Sized;
    type Commitment;

    fn commit(secret: &Self::Secret) -> Self::Commitment;
    fn verify(commitment: &Self::Commitment, secret: &Self::Secret) -> bool;
}

/// Answers are committed to as the Keccak-256 of their UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Scheme;

impl CommitmentScheme for Keccak256Scheme {
    type Secret = str;
    type Commitment = AnswerDigest;

    fn commit(secret: &str) -> AnswerDigest {
        AnswerDigest::of(secret)
    }

    fn verify(commitment: &AnswerDigest, secret: &str) -> bool {
        commitment.matches(secret)
    }
}
