use mockwright::{given, invocations, mockable, reset, witness};

#[mockable]
pub trait Greeter {
    fn greet(&self, name: &str) -> String;
    fn forget(&mut self);
}

struct Polite;

impl Greeter for Polite {
    fn greet(&self, name: &str) -> String { format!("Hello, {name}") }
    fn forget(&mut self) {}
}

struct Unreachable;

impl Greeter for Unreachable {
    fn greet(&self, _: &str) -> String { panic!("the spied greeter must not be called") }
    fn forget(&mut self) { panic!("the spied greeter must not be called") }
}

#[test]
fn spy_on_forwards_unstubbed_calls() {
    let spy = GreeterMock::spy_on(Polite);
    assert_eq!(spy.greet("Ann"), "Hello, Ann");
    assert_eq!(invocations(&spy, GreeterMock::GREET), 1);
}

#[test]
fn stubs_on_a_spy_win_without_touching_the_instance() {
    let spy = GreeterMock::spy(witness(), Unreachable);
    given(&spy, GreeterMock::GREET).returns(String::from("stubbed"));
    assert_eq!(spy.greet("Ann"), "stubbed");
}

#[test]
fn stubbed_mock_replays() {
    let mock = GreeterMock::mock(witness());
    given(&mock, GreeterMock::GREET).answers(|| String::from("hi"));
    assert_eq!(mock.greet("Bob"), "hi");
    assert_eq!(mock.greet("Cy"), "hi");
    assert_eq!(invocations(&mock, GreeterMock::GREET), 2);
}

#[test]
#[should_panic(expected = "`Greeter::greet` was called on a `Greeter` mock but never stubbed")]
fn unstubbed_mock_fails() {
    let mock = GreeterMock::mock(witness());
    mock.greet("Ann");
}

#[test]
fn unit_members_are_stubbed_by_default() {
    let mut mock = GreeterMock::any(witness());
    mock.forget();
    assert_eq!(invocations(&mock, GreeterMock::FORGET), 1);
}

#[test]
fn mocks_work_behind_trait_objects() {
    let mock = GreeterMock::mock(witness());
    given(&mock, GreeterMock::GREET).returns(String::from("boxed"));
    let boxed: Box<dyn Greeter> = Box::new(mock);
    assert_eq!(boxed.greet("x"), "boxed");
}

#[test]
#[should_panic(expected = "never stubbed")]
fn reset_forgets_stubs() {
    let mock = GreeterMock::mock(witness());
    given(&mock, GreeterMock::GREET).returns(String::from("hi"));
    reset(&mock);
    mock.greet("Ann");
}

#[mockable(stubs_unit_by_default = false, name = "StrictLogger")]
pub trait Logger {
    fn log(&self, line: &str);
}

#[test]
#[should_panic(expected = "`Logger::log` was called on a `Logger` mock but never stubbed")]
fn strict_unit_policy_fails_unstubbed_unit_calls() {
    let logger = StrictLogger::mock(witness());
    logger.log("hello");
}

#[test]
fn strict_unit_calls_succeed_once_stubbed() {
    let logger = StrictLogger::mock(witness());
    given(&logger, StrictLogger::LOG).returns(());
    logger.log("hello");
    assert_eq!(invocations(&logger, StrictLogger::LOG), 1);
}

#[mockable(exclude = "describe")]
pub trait Shape {
    fn area(&self) -> f64;

    fn describe(&self) -> String { format!("area {}", self.area()) }

    #[mockable(exclude)]
    fn sides(&self) -> u32 { 0 }
}

#[test]
fn excluded_members_keep_their_default_bodies() {
    let shape = ShapeMock::mock(witness());
    given(&shape, ShapeMock::AREA).returns(2.0f64);
    assert_eq!(shape.describe(), "area 2");
    assert_eq!(shape.sides(), 0);
}

#[mockable]
pub trait Repository<T: Clone> {
    fn find(&self, id: u32) -> Option<T>;
    fn save(&mut self, item: T);
}

#[test]
fn generic_traits_are_mocked_per_instantiation() {
    let mut repo = RepositoryMock::mock(witness::<dyn Repository<String>>());
    given(&repo, RepositoryMock::<String>::FIND).returns(Some(String::from("ada")));
    assert_eq!(repo.find(1).as_deref(), Some("ada"));
    repo.save(String::from("grace"));
    assert_eq!(invocations(&repo, RepositoryMock::<String>::SAVE), 1);
}

#[test]
fn mocks_are_send_when_the_trait_is() {
    #[mockable]
    pub trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    let clock = ClockMock::mock(witness());
    given(&clock, ClockMock::NOW).returns(42u64);
    let seen = std::thread::spawn(move || clock.now()).join().expect("thread finishes");
    assert_eq!(seen, 42);
}

#[mockable]
pub trait Catalog {
    #[mockable(exclude)]
    fn title(&self) -> &str;
    fn count(&self) -> usize;
}

#[test]
fn excluded_required_members_only_need_a_signature() {
    let catalog = CatalogMock::mock(witness());
    given(&catalog, CatalogMock::COUNT).returns(3usize);
    assert_eq!(catalog.count(), 3);
}

#[test]
#[should_panic(expected = "`Catalog::title` is excluded from `CatalogMock`")]
fn excluded_required_members_panic_when_called() {
    let catalog = CatalogMock::mock(witness());
    catalog.title();
}
