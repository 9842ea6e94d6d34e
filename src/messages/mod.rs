//! Post templates and display formatting.
//!
//! Every text the herald publishes is built here so the handlers only decide
//! *when* to post. Amounts arrive in wei and are shown in whole-currency
//! units ("S") with fixed decimals.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Native currency symbol shown after amounts.
pub const CURRENCY: &str = "S";

/// Fractional digits of one ether in wei.
const WEI_DECIMALS: u32 = 18;

/// Convert a wei amount to whole units, exact whenever it fits in a
/// `Decimal`. Larger amounts drop trailing wei digits until they fit; values
/// beyond `Decimal` range clamp to `Decimal::MAX`.
pub fn wei_to_ether(wei: U256) -> Decimal {
    let ten = U256::from(10u8);
    let mut mantissa = wei;
    for scale in (0..=WEI_DECIMALS).rev() {
        let exact = u128::try_from(mantissa)
            .ok()
            .and_then(|v| i128::try_from(v).ok())
            .and_then(|v| Decimal::try_from_i128_with_scale(v, scale).ok());
        if let Some(value) = exact {
            return value;
        }
        mantissa /= ten;
    }
    Decimal::MAX
}

/// Fixed-point display, e.g. `15.75`.
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, value.round_dp(decimals))
}

/// Jackpot / prize display with two decimals.
pub fn format_ether(value: Decimal) -> String {
    format_amount(value, 2)
}

/// Short address form: `0xABCD...7890`.
pub fn truncate_address(address: &Address) -> String {
    let digits = alloy::hex::encode_upper(address.as_slice());
    format!("0x{}...{}", &digits[..4], &digits[digits.len() - 4..])
}

/// "Just now", "5 minutes ago", "1 hour ago", "3 days ago".
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3_600 {
        plural(seconds / 60, "minute")
    } else if seconds < 86_400 {
        plural(seconds / 3_600, "hour")
    } else {
        plural(seconds / 86_400, "day")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {} ago", n, unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

pub fn startup(jackpot: Decimal) -> String {
    format!(
        "🚀 100x Jackpot DeFAI Agent is now active! Current jackpot: {} {}. \
         Will you solve the secret and win? #100xJackpot #DeFAI",
        format_ether(jackpot),
        CURRENCY
    )
}

pub fn jackpot_won(winner: &Address, amount: Decimal, guess: &str) -> String {
    format!(
        "🎊 JACKPOT WON! 🎊\n\n\
         Address {} just won {} {} by correctly guessing: '{}'\n\n\
         The jackpot has been reset. Can you solve the next secret? #100xJackpot #CryptoWin",
        truncate_address(winner),
        format_ether(amount),
        CURRENCY,
        guess
    )
}

pub fn jackpot_won_activity(winner: &Address, amount: Decimal, guess: &str) -> String {
    format!(
        "Jackpot won by {}: {} {} with guess '{}'",
        truncate_address(winner),
        format_ether(amount),
        CURRENCY,
        guess
    )
}

/// Known `SocialAnnouncement` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementTag {
    NewSecret,
    NewHint,
    JackpotFunded,
    JackpotWon,
}

impl AnnouncementTag {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "NEW_SECRET" => Some(Self::NewSecret),
            "NEW_HINT" => Some(Self::NewHint),
            "JACKPOT_FUNDED" => Some(Self::JackpotFunded),
            "JACKPOT_WON" => Some(Self::JackpotWon),
            _ => None,
        }
    }
}

pub fn new_secret() -> String {
    "🔐 A new secret has been set in the 100x Jackpot game! Can you solve it and win the jackpot? \
     #100xJackpot #CryptoGame"
        .to_string()
}

pub fn new_hint_announcement(message: &str) -> String {
    format!(
        "🔍 New hint available in the 100x Jackpot game! {} Purchase it in-game to get closer to \
         solving the secret! #100xJackpot",
        message
    )
}

pub fn jackpot_funded(jackpot: Decimal) -> String {
    format!(
        "💰 The jackpot has been funded! Current jackpot: {} {}. Will you be the one to solve the \
         secret? #100xJackpot #CryptoJackpot",
        format_ether(jackpot),
        CURRENCY
    )
}

pub fn jackpot_won_announcement(message: &str) -> String {
    format!("🎉 {} #100xJackpot #CryptoWin", message)
}

pub fn generic_announcement(kind: &str, message: &str) -> String {
    format!("📢 {}: {} #100xJackpot", kind, message)
}

pub fn player_milestone(count: u64, jackpot: Decimal) -> String {
    format!(
        "🎮 Welcome to our {}th player! The 100x Jackpot community keeps growing! \
         Current jackpot: {} {} #100xJackpot #CryptoGaming",
        count,
        format_ether(jackpot),
        CURRENCY
    )
}

pub fn hints_milestone(count: usize, jackpot: Decimal) -> String {
    format!(
        "🔍 {} hints have been purchased by players trying to solve the secret! \
         Will someone crack the code soon? Current jackpot: {} {} #100xJackpot #CryptoDetective",
        count,
        format_ether(jackpot),
        CURRENCY
    )
}

pub fn hint_added(jackpot: Decimal) -> String {
    format!(
        "🔍 New hint added to the 100x Jackpot game! Purchase it in-game to get closer to solving \
         the secret! Current jackpot: {} {} #100xJackpot #CryptoGame",
        format_ether(jackpot),
        CURRENCY
    )
}

/// Inputs of the periodic summary post.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub jackpot: Decimal,
    pub unique_players: u64,
    pub total_guesses: u64,
    pub token_price: Decimal,
    pub last_win: Option<DateTime<Utc>>,
}

pub fn summary(view: &SummaryView, now: DateTime<Utc>) -> String {
    let last_win = view
        .last_win
        .map(|t| format_time_ago(t, now))
        .unwrap_or_else(|| "Never".to_string());

    format!(
        "📊 100x Jackpot Game Update 📊\n\n\
         Current Jackpot: {} {}\n\
         Total Players: {}\n\
         Total Guesses: {}\n\
         100X Price: {} {}\n\
         Last Win: {}\n\n\
         #100xJackpot #DeFAI #CryptoGaming",
        format_ether(view.jackpot),
        CURRENCY,
        view.unique_players,
        view.total_guesses,
        format_amount(view.token_price, 8),
        CURRENCY,
        last_win
    )
}
