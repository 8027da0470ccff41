/// Parse a decimal string of zatoshi into an integer amount.
///
/// Only plain ASCII digits are accepted; no sign, separators or fraction.
/// Zero is rejected since it never describes a meaningful transfer.
pub fn parse_zatoshi(amount: &str) -> Result<u64, String> {
	if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
		return Err(format!("'{}' is not a decimal zatoshi amount", amount));
	}
	let value = amount
		.parse::<u64>()
		.map_err(|e| format!("'{}' is out of range: {}", amount, e))?;
	if value == 0 {
		return Err("amount must be greater than zero".to_string());
	}
	Ok(value)
}

/// Hex-encode a raw transaction id in display byte order (reversed).
pub fn txid_hex(raw_id: &[u8]) -> String {
	let reversed: Vec<u8> = raw_id.iter().rev().copied().collect();
	hex::encode(reversed)
}
