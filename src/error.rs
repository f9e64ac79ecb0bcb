#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrbError {
    // =========================================================================================
    // IMPORTANT: Don't add variables to variants in this  enum - it's a potential security risk
    // as you can leak internal state in an error as these can end up in userfacing contexts!!!
    //
    // In other words, any extra information you add here is a potential CVE.
    //
    // If you want to debug the error, then use the error! macro at the error raise site to
    // report relevant information.
    //
    // Lastly, the whole reason we have so many error variants is so that just from the error
    // variant alone, we already have a large amount of anonymised detail about the potential
    // cause the error.
    // =========================================================================================
    UnsupportedEncryption,
    UnsupportedChecksumType,
    UnsupportedSpakeGroup,
    ChecksumKeyMismatch,

    WrongSeedLength,
    WrongKeyLength,
    WrongScalarLength,
    InvalidConfounderLength,
    InvalidHmacSha1Key,

    PreauthInvalidS2KParams,
    PrfOutputTooLong,

    PlaintextTooShort,
    CiphertextTooShort,
    InvalidPadding,
    IntegrityFailure,
    ChecksumFailure,

    MalformedMessage,
    ProtocolInvariantViolation,
    SpakeInvalidState,
}
