pub mod digest {

    /// Realm baked into HA1 hashes when no realm is configured.
    pub const DEFAULT_REALM: &str = "credstore";

    /// Default nonce-count sequence accepted on first challenge.
    pub const INITIAL_SEQUENCE: &str = "00000001";
}

pub mod keys {

    /// Generated API key length in hex characters (32 random bytes).
    pub const API_KEY_HEX_LEN: usize = 64;

    pub const DEFAULT_ENVIRONMENT: &str = "live";

    pub const DEFAULT_KEY_TYPE: &str = "secret";
}
