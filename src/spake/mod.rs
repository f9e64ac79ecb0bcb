//! The SPAKE pre-authentication engine. A [SpakeSession] carries one side of a
//! single exchange from the blinding factor through to the four confirmation
//! keys. Message encoding is left to the caller, who passes the exact bytes
//! sent and received so the transcript checksum covers them.

pub mod config;
mod edwards25519;
mod group;
mod nist;

pub use self::edwards25519::Edwards25519;
pub use self::group::{GroupNumber, SpakeGroup};
pub use self::nist::{P256, P384, P521};
pub use crate::constants::{KEY_USAGE_SPAKE_FACTOR, KEY_USAGE_SPAKE_TRANSCRIPT};

use crate::constants::{SPAKE_KEY_LABEL, SPAKE_SECRET_LABEL};
use crate::crypto::{self, ChecksumType, Key};
use crate::error::KrbError;

use rand::CryptoRng;
use std::fmt;
use tracing::{debug, error, trace};
use zeroize::{Zeroize, Zeroizing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpakeRole {
    /// Sends the challenge, blinds with M.
    Kdc,
    /// Sends the response, blinds with N.
    Client,
}

/// Progress of a session. [SpakeSession::new] derives the blinding factor, so
/// a session is never observed before [SpakeState::BlindingDerived]. The final
/// keys derived state is reached by [SpakeSession::derive_confirmation_keys],
/// which consumes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpakeState {
    BlindingDerived,
    EphemeralGenerated,
    MessagesExchanged,
    SharedPointComputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TranscriptStage {
    Empty,
    RejectedChallenge,
    Support,
    Challenge,
    Complete,
}

/// The running checksum over the messages of one exchange.
///
/// Each message is folded in as `cksum = checksum(key, 65, cksum || msg)`. The
/// accepted orders are
///
/// * support, challenge, S
/// * challenge, S, when an optimistic challenge was accepted
/// * rejected challenge, support, challenge, S
///
/// where S is the encoding of the client's public key. Anything else is
/// refused with [KrbError::SpakeInvalidState].
#[derive(Debug, Clone)]
pub struct SpakeTranscript {
    cksumtype: ChecksumType,
    cksum: Vec<u8>,
    stage: TranscriptStage,
}

impl SpakeTranscript {
    pub fn new(cksumtype: ChecksumType) -> Self {
        SpakeTranscript {
            cksumtype,
            cksum: vec![0u8; cksumtype.mac_size()],
            stage: TranscriptStage::Empty,
        }
    }

    fn update(
        &mut self,
        key: &Key,
        allowed: &[TranscriptStage],
        next: TranscriptStage,
        msg: &[u8],
    ) -> Result<(), KrbError> {
        if !allowed.contains(&self.stage) {
            error!(stage = ?self.stage, ?next, "spake transcript updated out of order");
            return Err(KrbError::SpakeInvalidState);
        }

        let mut input = Vec::with_capacity(self.cksum.len() + msg.len());
        input.extend_from_slice(&self.cksum);
        input.extend_from_slice(msg);

        self.cksum =
            crypto::make_checksum(self.cksumtype, key, KEY_USAGE_SPAKE_TRANSCRIPT, &input)?;
        self.stage = next;

        trace!(stage = ?next, msg_len = msg.len(), "spake transcript updated");
        Ok(())
    }

    /// An optimistic challenge that the client rejected. Must come first.
    pub fn record_rejected_challenge(&mut self, key: &Key, msg: &[u8]) -> Result<(), KrbError> {
        self.update(
            key,
            &[TranscriptStage::Empty],
            TranscriptStage::RejectedChallenge,
            msg,
        )
    }

    pub fn record_support(&mut self, key: &Key, msg: &[u8]) -> Result<(), KrbError> {
        self.update(
            key,
            &[TranscriptStage::Empty, TranscriptStage::RejectedChallenge],
            TranscriptStage::Support,
            msg,
        )
    }

    /// The challenge carrying this run's T. Without a preceding support message
    /// this is an accepted optimistic challenge.
    pub fn record_challenge(&mut self, key: &Key, msg: &[u8]) -> Result<(), KrbError> {
        self.update(
            key,
            &[TranscriptStage::Empty, TranscriptStage::Support],
            TranscriptStage::Challenge,
            msg,
        )
    }

    /// The bare encoding of the client's public key S.
    pub fn record_public_key(&mut self, key: &Key, point: &[u8]) -> Result<(), KrbError> {
        self.update(
            key,
            &[TranscriptStage::Challenge],
            TranscriptStage::Complete,
            point,
        )
    }

    pub fn checksum(&self) -> &[u8] {
        &self.cksum
    }

    pub fn is_complete(&self) -> bool {
        self.stage == TranscriptStage::Complete
    }
}

/// Derive confirmation key `n` from the shared point, the final transcript
/// checksum and the encoded request body.
pub fn derive_confirmation_key(
    key: &Key,
    group: GroupNumber,
    shared_point: &[u8],
    transcript_checksum: &[u8],
    body: &[u8],
    n: u32,
) -> Result<Key, KrbError> {
    let enctype = key.enctype();

    let mut input = Zeroizing::new(Vec::with_capacity(
        SPAKE_KEY_LABEL.len() + 12 + shared_point.len() + transcript_checksum.len() + body.len(),
    ));
    input.extend_from_slice(SPAKE_KEY_LABEL);
    input.extend_from_slice(&i32::from(group).to_be_bytes());
    input.extend_from_slice(&i32::from(enctype).to_be_bytes());
    input.extend_from_slice(shared_point);
    input.extend_from_slice(transcript_checksum);
    input.extend_from_slice(body);
    input.extend_from_slice(&n.to_be_bytes());

    let seed = Zeroizing::new(crypto::prf_plus(key, &input, enctype.seed_size())?);
    crypto::random_to_key(enctype, &seed)
}

/// One side of a SPAKE exchange over the group `G`.
///
/// The caller drives the exchange: record the messages that preceded this
/// run's challenge, compute and record the challenge, then compute the shared
/// point from the peer's public key.
pub struct SpakeSession<G: SpakeGroup> {
    role: SpakeRole,
    key: Key,
    w: G::Scalar,
    // The ephemeral scalar divided by the cofactor. Multiplying by it and then
    // clearing the cofactor gives the published scalar's product.
    r: Option<G::Scalar>,
    own_public: Option<Vec<u8>>,
    transcript: SpakeTranscript,
    shared_point: Option<Zeroizing<Vec<u8>>>,
}

impl<G: SpakeGroup> Drop for SpakeSession<G> {
    fn drop(&mut self) {
        self.zeroize_scalars();
    }
}

impl<G: SpakeGroup> fmt::Debug for SpakeSession<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpakeSession")
            .field("group", &G::GROUP)
            .field("role", &self.role)
            .field("state", &self.state())
            .finish()
    }
}

impl<G: SpakeGroup> SpakeSession<G> {
    /// Start a session, deriving the blinding factor w from the long term key.
    pub fn new(role: SpakeRole, key: &Key) -> Result<Self, KrbError> {
        let group = G::GROUP;

        let mut input = Vec::with_capacity(SPAKE_SECRET_LABEL.len() + 4);
        input.extend_from_slice(SPAKE_SECRET_LABEL);
        input.extend_from_slice(&i32::from(group).to_be_bytes());

        let multiplier = Zeroizing::new(crypto::prf_plus(key, &input, group.multiplier_len())?);
        let w = G::reduce_scalar(&multiplier);

        debug!(?group, ?role, enctype = ?key.enctype(), "spake session started");

        Ok(SpakeSession {
            role,
            key: key.clone(),
            w,
            r: None,
            own_public: None,
            transcript: SpakeTranscript::new(key.enctype().checksum_type()),
            shared_point: None,
        })
    }

    fn zeroize_scalars(&mut self) {
        self.w.zeroize();
        self.r.zeroize();
    }

    pub fn role(&self) -> SpakeRole {
        self.role
    }

    pub fn group(&self) -> GroupNumber {
        G::GROUP
    }

    pub fn state(&self) -> SpakeState {
        if self.shared_point.is_some() {
            SpakeState::SharedPointComputed
        } else if self.own_public.is_some() {
            SpakeState::MessagesExchanged
        } else if self.r.is_some() {
            SpakeState::EphemeralGenerated
        } else {
            SpakeState::BlindingDerived
        }
    }

    pub fn transcript(&self) -> &SpakeTranscript {
        &self.transcript
    }

    fn set_ephemeral(&mut self, r: G::Scalar) -> Result<(), KrbError> {
        if self.state() != SpakeState::BlindingDerived {
            error!(state = ?self.state(), "spake ephemeral scalar already set");
            return Err(KrbError::SpakeInvalidState);
        }
        self.r = Some(r);
        trace!(group = ?G::GROUP, "spake ephemeral scalar set");
        Ok(())
    }

    /// Draw the ephemeral scalar from `rng`.
    pub fn generate_ephemeral<R: CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), KrbError> {
        self.set_ephemeral(G::random_scalar(rng))
    }

    /// Use a fixed ephemeral scalar: the full, cofactor multiplied value in the
    /// group's byte order, as published with test vectors.
    pub fn load_ephemeral(&mut self, bytes: &[u8]) -> Result<(), KrbError> {
        if bytes.len() != G::GROUP.multiplier_len() {
            error!(
                len = bytes.len(),
                group = ?G::GROUP,
                "spake ephemeral scalar has the wrong length"
            );
            return Err(KrbError::WrongScalarLength);
        }
        self.set_ephemeral(G::reduce_scalar(bytes) * G::cofactor_inverse())
    }

    fn compute_public(&mut self, expect: SpakeRole) -> Result<Vec<u8>, KrbError> {
        if self.role != expect {
            error!(role = ?self.role, "spake public key requested for the wrong role");
            return Err(KrbError::SpakeInvalidState);
        }
        if self.state() != SpakeState::EphemeralGenerated {
            error!(state = ?self.state(), "spake public key computed out of order");
            return Err(KrbError::SpakeInvalidState);
        }
        let r = self.r.ok_or(KrbError::SpakeInvalidState)?;

        let blind = match self.role {
            SpakeRole::Kdc => G::constant_m()?,
            SpakeRole::Client => G::constant_n()?,
        };

        let public = blind * self.w + G::clear_cofactor(G::generator() * r);
        let encoded = G::encode_point(&public);
        self.own_public = Some(encoded.clone());
        Ok(encoded)
    }

    /// The KDC's public key T, to be carried in the challenge.
    pub fn compute_challenge(&mut self) -> Result<Vec<u8>, KrbError> {
        self.compute_public(SpakeRole::Kdc)
    }

    /// The client's public key S, to be carried in the response.
    pub fn compute_response(&mut self) -> Result<Vec<u8>, KrbError> {
        self.compute_public(SpakeRole::Client)
    }

    pub fn record_rejected_challenge(&mut self, msg: &[u8]) -> Result<(), KrbError> {
        self.transcript.record_rejected_challenge(&self.key, msg)
    }

    pub fn record_support(&mut self, msg: &[u8]) -> Result<(), KrbError> {
        self.transcript.record_support(&self.key, msg)
    }

    pub fn record_challenge(&mut self, msg: &[u8]) -> Result<(), KrbError> {
        self.transcript.record_challenge(&self.key, msg)
    }

    /// Compute K from the peer's public key and fold S into the transcript. The
    /// challenge must already be recorded.
    pub fn compute_shared_point(&mut self, peer_public: &[u8]) -> Result<(), KrbError> {
        if self.state() != SpakeState::MessagesExchanged
            || self.transcript.stage != TranscriptStage::Challenge
        {
            error!(
                state = ?self.state(),
                transcript = ?self.transcript.stage,
                "spake shared point computed out of order"
            );
            return Err(KrbError::SpakeInvalidState);
        }
        let r = self.r.ok_or(KrbError::SpakeInvalidState)?;

        let peer = G::decode_point(peer_public)?;
        let peer_blind = match self.role {
            SpakeRole::Kdc => G::constant_n()?,
            SpakeRole::Client => G::constant_m()?,
        };

        // Both sides are the same point for any correct group arithmetic. This
        // catches a faulty group implementation, not a hostile peer.
        let shared = G::clear_cofactor((peer - peer_blind * self.w) * r);
        let check =
            G::clear_cofactor(peer * r) - G::clear_cofactor(peer_blind * (self.w * r));
        if shared != check {
            error!(group = ?G::GROUP, "spake shared point cross-check failed");
            return Err(KrbError::ProtocolInvariantViolation);
        }

        let s = match self.role {
            SpakeRole::Kdc => peer_public.to_vec(),
            SpakeRole::Client => self.own_public.clone().ok_or(KrbError::SpakeInvalidState)?,
        };
        self.transcript.record_public_key(&self.key, &s)?;
        self.shared_point = Some(Zeroizing::new(G::encode_point(&shared)));

        debug!(group = ?G::GROUP, role = ?self.role, "spake shared point computed");
        Ok(())
    }

    /// Derive the four confirmation keys K'[0] to K'[3] over the encoded request
    /// body. This ends the session.
    pub fn derive_confirmation_keys(self, body: &[u8]) -> Result<[Key; 4], KrbError> {
        let shared_point = self.shared_point.as_ref().ok_or_else(|| {
            error!(state = ?self.state(), "spake keys requested before the shared point");
            KrbError::SpakeInvalidState
        })?;
        let cksum = self.transcript.checksum();

        let derive = |n| {
            derive_confirmation_key(&self.key, G::GROUP, shared_point, cksum, body, n)
        };
        Ok([derive(0)?, derive(1)?, derive(2)?, derive(3)?])
    }
}
