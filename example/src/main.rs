use mockwright::{given, invocations, mockable, witness};

// Attribute macro on a trait: generates `StorageMock`
#[mockable]
pub trait Storage {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&mut self, key: &str, value: String);
}

struct Memory(std::collections::HashMap<String, String>);

impl Storage for Memory {
    fn load(&self, key: &str) -> Option<String> { self.0.get(key).cloned() }
    fn store(&mut self, key: &str, value: String) { self.0.insert(key.to_string(), value); }
}

pub struct Session {
    storage: Box<dyn Storage>,
    user: String,
}

// Attribute macro on an inherent impl: generates `SessionMock`, whose constructor
// arguments are synthesized (`StorageMock` for the storage, "" for the user)
#[mockable(auto_mock = "Storage")]
impl Session {
    pub fn new(storage: Box<dyn Storage>, user: String) -> Self { Session { storage, user } }

    pub fn greeting(&self) -> String {
        let name = self.storage.load(&self.user).unwrap_or_else(|| self.user.clone());
        format!("welcome back, {name}")
    }
}

fn main() {
    // A plain mock: every non-unit call must be stubbed first
    let storage = StorageMock::mock(witness());
    given(&storage, StorageMock::LOAD).returns(Some(String::from("Ada")));
    let session = Session::new(Box::new(storage), String::from("ada"));
    println!("{}", session.greeting());

    // A spy: unstubbed calls reach the real store
    let mut spy = StorageMock::spy_on(Memory(Default::default()));
    spy.store("k", String::from("v"));
    println!("spy load(k) = {:?}", spy.load("k"));
    println!("store was called {} time(s)", invocations(&spy, StorageMock::STORE));

    // A class mock: stub the member under test, ignore the rest
    let session = SessionMock::mock(witness());
    given(&session, SessionMock::GREETING).returns(String::from("stubbed greeting"));
    println!("{}", session.greeting());
}
