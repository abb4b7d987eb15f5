//! Fee estimate command.
//!
//! ```bash
//! mb-cli fees --asin B00EXAMPLE --price 19.99 --currency MXN --fba
//! ```

use rust_decimal::Decimal;

use super::{CommandError, spapi_client};

/// Estimate the total fees for listing `asin` at `price` and print them.
pub async fn estimate(asin: &str, price: Decimal, currency: &str, fba: bool) -> Result<(), CommandError> {
    if asin.trim().is_empty() {
        return Err(CommandError::InvalidArgument("--asin must not be empty".to_owned()));
    }
    if price.is_sign_negative() {
        return Err(CommandError::InvalidArgument(format!("--price must not be negative, got {price}")));
    }

    let client = spapi_client()?;
    let total = client.get_fees_estimate(asin.trim(), price, currency, fba).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{asin}: {total} {currency}");
    }
    Ok(())
}
