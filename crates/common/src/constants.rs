// data sources
pub const DEFAULT_PROXY_URL: &str = "http://localhost:8787/aptos-graphql";
pub const APTOS_MAINNET_NODE: &str = "https://fullnode.mainnet.aptoslabs.com";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// aptos coin
pub const OCTAS_PER_APT: f64 = 100_000_000.0;
pub const TRANSFER_FUNCTIONS: [&str; 3] = [
    "0x1::aptos_account::transfer",
    "0x1::aptos_account::transfer_coins",
    "0x1::coin::transfer",
];
