use mockwright::{given, invocations, mockable, witness};

#[mockable]
pub trait Dependency {
    fn render(&self) -> String;
}

struct Fixed;

impl Dependency for Fixed {
    fn render(&self) -> String { String::from("fixed") }
}

pub struct Widget {
    dep: Box<dyn Dependency>,
    size: u32,
    label: String,
    theme: Option<Theme>,
}

pub struct Theme;

#[mockable(auto_mock = "Dependency")]
impl Widget {
    pub fn new(dep: Box<dyn Dependency>, size: u32, label: String, theme: Option<Theme>) -> Self {
        Widget { dep, size, label, theme }
    }

    pub fn paint(&self) -> String { format!("{} at {}", self.dep.render(), self.size) }

    pub fn resize(&mut self, size: u32) { self.size = size; }

    #[mockable(exclude)]
    pub fn area(&self) -> u32 { self.size * self.size }
}

#[test]
#[should_panic(expected = "`Widget::paint` was called on a `Widget` mock but never stubbed")]
fn unstubbed_class_member_fails() {
    let widget = WidgetMock::mock(witness());
    widget.paint();
}

#[test]
fn stubbed_class_member_replays() {
    let widget = WidgetMock::mock(witness());
    given(&widget, WidgetMock::PAINT).returns(String::from("ok"));
    assert_eq!(widget.paint(), "ok");
    assert_eq!(invocations(&widget, WidgetMock::PAINT), 1);
}

#[test]
fn constructor_arguments_are_synthesized() {
    let widget = WidgetMock::mock(witness());
    assert_eq!(widget.size, 0);
    assert!(widget.label.is_empty());
    assert!(widget.theme.is_none());
    assert_eq!(widget.area(), 0);
}

#[test]
#[should_panic(expected = "`Dependency::render` was called on a `Dependency` mock but never stubbed")]
fn dependencies_are_auto_mocked() {
    let widget = WidgetMock::mock(witness());
    widget.dep.render();
}

#[test]
fn spy_on_forwards_to_the_real_widget() {
    let real = Widget::new(Box::new(Fixed), 3, String::from("real"), None);
    let mut spy = WidgetMock::spy_on(real);
    assert_eq!(spy.paint(), "fixed at 3");
    spy.resize(4);
    given(&spy, WidgetMock::PAINT).returns(String::from("stubbed"));
    assert_eq!(spy.paint(), "stubbed");
}

#[test]
fn unit_members_default_to_doing_nothing() {
    let mut widget = WidgetMock::any(witness());
    widget.resize(10);
    assert_eq!(widget.size, 0);
}

pub struct Category {
    parent: Option<Box<Category>>,
    name: String,
}

#[mockable]
impl Category {
    pub fn new(parent: Option<Category>, name: String) -> Self { Category { parent: parent.map(Box::new), name } }

    pub fn depth(&self) -> usize { self.parent.as_ref().map_or(0, |p| p.depth() + 1) }
}

#[test]
fn self_referencing_optional_parameter_is_none() {
    let category = CategoryMock::mock(witness());
    assert!(category.parent.is_none());
    assert!(category.name.is_empty());
    given(&category, CategoryMock::DEPTH).returns(7usize);
    assert_eq!(category.depth(), 7);
}
