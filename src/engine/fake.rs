//! Scripted in-memory engine used by the unit tests.

use super::*;

use futures::channel::mpsc::{UnboundedSender, unbounded};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) struct FakeEngine {
	calls: Mutex<Vec<String>>,
	failures: Mutex<HashSet<&'static str>>,
	state_senders: Mutex<Vec<UnboundedSender<EngineState>>>,
	event_senders: Mutex<Vec<UnboundedSender<EngineEvent>>>,
	latest_height: AtomicU64,
	recipients: Mutex<HashMap<Vec<u8>, Vec<Recipient>>>,
	memos: Mutex<HashMap<Vec<u8>, Vec<String>>>,
	delays: Mutex<HashMap<&'static str, Duration>>,
}

impl FakeEngine {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self {
			calls: Mutex::new(Vec::new()),
			failures: Mutex::new(HashSet::new()),
			state_senders: Mutex::new(Vec::new()),
			event_senders: Mutex::new(Vec::new()),
			latest_height: AtomicU64::new(0),
			recipients: Mutex::new(HashMap::new()),
			memos: Mutex::new(HashMap::new()),
			delays: Mutex::new(HashMap::new()),
		})
	}

	/// Make every later call to `op` fail.
	pub(crate) fn fail(&self, op: &'static str) {
		self.failures.lock().unwrap().insert(op);
	}

	pub(crate) fn heal(&self, op: &'static str) {
		self.failures.lock().unwrap().remove(op);
	}

	/// Make every later call to `op` take `delay` before it completes.
	pub(crate) fn set_delay(&self, op: &'static str, delay: Duration) {
		self.delays.lock().unwrap().insert(op, delay);
	}

	async fn pause(&self, op: &'static str) {
		let delay = self.delays.lock().unwrap().get(op).copied();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
	}

	pub(crate) fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}

	pub(crate) fn set_latest_height(&self, height: u64) {
		self.latest_height.store(height, Ordering::SeqCst);
	}

	pub(crate) fn set_recipients(&self, raw_id: &[u8], recipients: Vec<Recipient>) {
		self.recipients
			.lock()
			.unwrap()
			.insert(raw_id.to_vec(), recipients);
	}

	pub(crate) fn set_memos(&self, raw_id: &[u8], memos: Vec<String>) {
		self.memos.lock().unwrap().insert(raw_id.to_vec(), memos);
	}

	pub(crate) fn push_state(&self, state: EngineState) {
		self.state_senders
			.lock()
			.unwrap()
			.retain(|tx| tx.unbounded_send(state.clone()).is_ok());
	}

	pub(crate) fn push_event(&self, event: EngineEvent) {
		self.event_senders
			.lock()
			.unwrap()
			.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
	}

	/// Number of subscriptions whose consumer is still alive.
	pub(crate) fn live_subscriptions(&self) -> usize {
		let states = self
			.state_senders
			.lock()
			.unwrap()
			.iter()
			.filter(|tx| !tx.is_closed())
			.count();
		let events = self
			.event_senders
			.lock()
			.unwrap()
			.iter()
			.filter(|tx| !tx.is_closed())
			.count();
		states + events
	}

	fn record(&self, call: impl Into<String>, op: &'static str) -> Result<(), EngineError> {
		self.calls.lock().unwrap().push(call.into());
		if self.failures.lock().unwrap().contains(op) {
			return Err(EngineError::Operation(format!("{} failed", op)));
		}
		Ok(())
	}
}

#[async_trait::async_trait]
impl SyncEngine for FakeEngine {
	async fn prepare(&self) -> Result<(), EngineError> {
		self.pause("prepare").await;
		self.record("prepare", "prepare")
	}

	async fn start(&self) -> Result<(), EngineError> {
		self.pause("start").await;
		self.record("start", "start")
	}

	async fn stop(&self) -> Result<(), EngineError> {
		self.pause("stop").await;
		self.record("stop", "stop")
	}

	async fn rewind(&self, height: u64) -> Result<(), EngineError> {
		self.pause("rewind").await;
		self.record(format!("rewind:{}", height), "rewind")
	}

	async fn latest_height(&self) -> Result<u64, EngineError> {
		self.record("latest_height", "latest_height")?;
		Ok(self.latest_height.load(Ordering::SeqCst))
	}

	fn state_stream(&self) -> EngineStream<EngineState> {
		let (tx, rx) = unbounded();
		self.state_senders.lock().unwrap().push(tx);
		Box::pin(rx)
	}

	fn event_stream(&self) -> EngineStream<EngineEvent> {
		let (tx, rx) = unbounded();
		self.event_senders.lock().unwrap().push(tx);
		Box::pin(rx)
	}

	async fn recipients(&self, tx: &TransactionOverview) -> Result<Vec<Recipient>, EngineError> {
		self.pause("recipients").await;
		self.record("recipients", "recipients")?;
		Ok(self
			.recipients
			.lock()
			.unwrap()
			.get(&tx.raw_id)
			.cloned()
			.unwrap_or_default())
	}

	async fn memos(&self, tx: &TransactionOverview) -> Result<Vec<String>, EngineError> {
		self.pause("memos").await;
		self.record("memos", "memos")?;
		Ok(self
			.memos
			.lock()
			.unwrap()
			.get(&tx.raw_id)
			.cloned()
			.unwrap_or_default())
	}

	async fn addresses(&self, account: u32) -> Result<UnifiedAddresses, EngineError> {
		self.record("addresses", "addresses")?;
		Ok(UnifiedAddresses {
			unified_address: format!("u1account{}", account),
			sapling_address: format!("zs1account{}", account),
			transparent_address: format!("t1account{}", account),
		})
	}

	async fn send_to_address(
		&self,
		_spending_material: &KeyMaterial,
		zatoshi: u64,
		to_address: &str,
		_memo: Option<&str>,
	) -> Result<SubmittedTransaction, EngineError> {
		self.record(format!("send:{}:{}", zatoshi, to_address), "send")?;
		Ok(SubmittedTransaction {
			raw_id: vec![0x01, 0x02, 0xab],
			raw: Some(vec![0xde, 0xad]),
		})
	}

	async fn shield_funds(
		&self,
		_spending_material: &KeyMaterial,
		_memo: &str,
		threshold: u64,
	) -> Result<SubmittedTransaction, EngineError> {
		self.record(format!("shield:{}", threshold), "shield")?;
		Ok(SubmittedTransaction {
			raw_id: vec![0x0f, 0xf0],
			raw: None,
		})
	}
}

/// Factory handing out `FakeEngine`s and remembering them per alias.
pub(crate) struct FakeFactory {
	created: AtomicUsize,
	fail_next: Mutex<Option<EngineError>>,
	delay: Duration,
	engines: Mutex<HashMap<String, Arc<FakeEngine>>>,
	params: Mutex<Vec<EngineParams>>,
}

impl FakeFactory {
	pub(crate) fn new() -> Arc<Self> {
		Self::with_delay(Duration::ZERO)
	}

	pub(crate) fn with_delay(delay: Duration) -> Arc<Self> {
		Arc::new(Self {
			created: AtomicUsize::new(0),
			fail_next: Mutex::new(None),
			delay,
			engines: Mutex::new(HashMap::new()),
			params: Mutex::new(Vec::new()),
		})
	}

	pub(crate) fn fail_next(&self, error: EngineError) {
		*self.fail_next.lock().unwrap() = Some(error);
	}

	pub(crate) fn created(&self) -> usize {
		self.created.load(Ordering::SeqCst)
	}

	pub(crate) fn engine(&self, alias: &str) -> Arc<FakeEngine> {
		self.engines
			.lock()
			.unwrap()
			.get(alias)
			.cloned()
			.expect("no engine constructed for alias")
	}

	pub(crate) fn params(&self) -> Vec<EngineParams> {
		self.params.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl EngineFactory for FakeFactory {
	async fn create(&self, params: EngineParams) -> Result<Arc<dyn SyncEngine>, EngineError> {
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		if let Some(error) = self.fail_next.lock().unwrap().take() {
			return Err(error);
		}
		self.created.fetch_add(1, Ordering::SeqCst);
		let engine = FakeEngine::new();
		self.engines
			.lock()
			.unwrap()
			.insert(params.alias.clone(), engine.clone());
		self.params.lock().unwrap().push(params);
		Ok(engine)
	}
}

/// Derivation tool and block source with prefix-based address rules.
pub(crate) struct FakeTools;

#[async_trait::async_trait]
impl DerivationTool for FakeTools {
	async fn derive_viewing_key(
		&self,
		seed: &KeyMaterial,
		network: Network,
	) -> Result<String, EngineError> {
		match seed {
			KeyMaterial::SeedPhrase(words) if !words.trim().is_empty() => {
				Ok(format!("uview-{}-{}", network, words.split_whitespace().count()))
			}
			_ => Err(EngineError::InvalidKeyMaterial(
				"seed phrase required".to_string(),
			)),
		}
	}

	fn is_valid_address(&self, address: &str, network: Network) -> bool {
		let prefixes: &[&str] = match network {
			Network::Mainnet => &["u1", "zs1", "t1"],
			Network::Testnet => &["utest1", "ztestsapling1", "tm"],
		};
		prefixes.iter().any(|p| address.starts_with(p))
	}
}

#[async_trait::async_trait]
impl BlockSource for FakeTools {
	async fn latest_block_height(&self, endpoint: &Endpoint) -> Result<u64, EngineError> {
		if endpoint.host == "unreachable" {
			return Err(EngineError::Network(format!("cannot reach {}", endpoint)));
		}
		Ok(2_000_000)
	}
}
