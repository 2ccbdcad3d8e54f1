//! Engine behavior against the in-memory document and outline.

use mathflow_core::render::KATEX_CLASS;
use mathflow_core::visibility::is_showing_rendered;
use mathflow_core::{
    ContainerSync, ContentKind, Dom, Engine, FocusState, HostLayout, HostOutline, ItemId, Key,
    KeyInput, MathRenderer, MathmlRenderer, MemoryDom, MemoryOutline, MutationRecord, NodeId,
    RenderOptions,
};

type TestEngine = Engine<MemoryDom, MemoryOutline, MathmlRenderer, ()>;

fn engine(outline: &MemoryOutline) -> TestEngine {
    let dom = outline.dom().clone();
    let sync = ContainerSync::new(
        MathmlRenderer,
        (),
        HostLayout::default(),
        RenderOptions::default(),
    );
    Engine::new(dom.clone(), outline.clone(), dom.body(), sync)
}

fn container(engine: &TestEngine, element: NodeId) -> Option<NodeId> {
    engine.container_sync().container(engine.dom(), &element)
}

fn shows_rendered(engine: &TestEngine, element: NodeId) -> bool {
    container(engine, element)
        .is_some_and(|c| is_showing_rendered(engine.dom(), &element, &c))
}

fn containers_in(dom: &MemoryDom) -> usize {
    dom.descendants_with_class(&dom.body(), mathflow_core::CONTAINER_CLASS)
        .len()
}

/// A focused, B and C not; A and C have math.
fn fixture() -> MemoryOutline {
    let outline = MemoryOutline::new(&MemoryDom::new());
    outline.add_item("a", "area $\\pi r^2$");
    outline.add_item("b", "plain text");
    outline.add_item("c", "sum $$\\sum_i i$$");
    outline.focus(Some("a"));
    outline
}

#[test]
fn render_all_respects_focus() {
    let outline = fixture();
    let mut engine = engine(&outline);
    assert_eq!(engine.render_all(), 2);

    let a = outline.name_element("a").unwrap();
    let b = outline.name_element("b").unwrap();
    let c = outline.name_element("c").unwrap();
    assert!(container(&engine, a).is_some());
    assert!(!shows_rendered(&engine, a));
    assert!(container(&engine, b).is_none());
    assert!(shows_rendered(&engine, c));
    assert_eq!(engine.focus_state().current(), Some(&ItemId::from("a")));
}

#[test]
fn render_all_is_scoped_to_current_item() {
    let outline = fixture();
    outline.add_child("b", "b1", "$z$");
    outline.zoom(Some("b"));
    let mut engine = engine(&outline);
    assert_eq!(engine.render_all(), 1);
    assert!(container(&engine, outline.name_element("b1").unwrap()).is_some());
    assert!(container(&engine, outline.name_element("a").unwrap()).is_none());
}

#[test]
fn focus_moving_away_renders_and_target_goes_raw() {
    let outline = fixture();
    let mut engine = engine(&outline);
    engine.render_all();

    outline.focus(Some("c"));
    let transition = engine.on_deferred_key(Key::Other).unwrap();
    assert_eq!(transition.to, ItemId::from("c"));
    assert_eq!(transition.rerender, vec![ItemId::from("a")]);

    assert!(shows_rendered(&engine, outline.name_element("a").unwrap()));
    let c = outline.name_element("c").unwrap();
    assert!(!shows_rendered(&engine, c));
    assert_eq!(engine.dom().text_content(&c), "sum $$\\sum_i i$$");
    assert_eq!(engine.focus_state().previous(), Some(&ItemId::from("a")));
    assert_eq!(containers_in(outline.dom()), 2);
}

#[test]
fn repeated_ticks_are_idempotent() {
    let outline = fixture();
    let mut engine = engine(&outline);
    engine.render_all();
    outline.focus(Some("b"));

    assert!(engine.on_focus_change().is_some());
    let html = outline.dom().to_html(outline.dom().body());
    assert!(engine.on_deferred_key(Key::Other).is_none());
    assert!(engine.on_focus_change().is_none());
    let records = vec![MutationRecord::new(outline.dom().body(), vec![])];
    engine.on_mutations(&records);
    assert_eq!(outline.dom().to_html(outline.dom().body()), html);
    assert_eq!(containers_in(outline.dom()), 2);
}

#[test]
fn interleavings_converge() {
    // The same host change delivered as deferred-tick-then-batch and as
    // batch-then-deferred-tick must leave identical documents.
    let run = |tick_first: bool| {
        let outline = fixture();
        let mut engine = engine(&outline);
        engine.render_all();

        let d = outline.add_item("d", "`x^2` new");
        outline.focus(Some("d"));
        let records = vec![MutationRecord::new(outline.dom().body(), vec![d])];
        if tick_first {
            engine.on_deferred_key(Key::Other);
            engine.on_mutations(&records);
        } else {
            engine.on_mutations(&records);
            engine.on_deferred_key(Key::Other);
        }
        let state = engine.focus_state().clone();
        (outline.dom().to_html(outline.dom().body()), state)
    };

    let (tick_first, state_a) = run(true);
    let (batch_first, state_b) = run(false);
    assert_eq!(tick_first, batch_first);
    assert_eq!(state_a, state_b);
    assert_eq!(
        state_a,
        FocusState::new(Some("d".into()), Some("a".into()))
    );
}

#[test]
fn inserted_unfocused_item_renders() {
    let outline = fixture();
    let mut engine = engine(&outline);
    engine.render_all();

    let e = outline.add_item("e", "scrolled in $e^x$");
    let note = outline.set_note("e", "with `a/b` note").unwrap();
    let outcome = engine.on_mutations(&[MutationRecord::new(outline.dom().body(), vec![e])]);
    assert_eq!(outcome.transition, None);
    assert_eq!(outcome.rendered, 2);
    assert!(shows_rendered(&engine, outline.name_element("e").unwrap()));
    assert!(shows_rendered(&engine, note));
}

#[test]
fn backspace_at_start_turns_previous_raw_before_merge() {
    let outline = fixture();
    outline.focus(Some("b"));
    let mut engine = engine(&outline);
    engine.render_all();
    let a = outline.name_element("a").unwrap();
    assert!(shows_rendered(&engine, a));

    let handled = engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(0).in_item("b"));
    assert!(handled);
    assert!(container(&engine, a).is_none());
    assert!(!engine.dom().has_class(&a, mathflow_core::HIDDEN_CLASS));
    assert_eq!(engine.dom().text_content(&a), "area $\\pi r^2$");

    // Host merges B into A and moves the cursor there.
    let merged = format!(
        "{}{}",
        engine.dom().text_content(&a),
        engine.dom().text_content(&outline.name_element("b").unwrap())
    );
    outline.set_text("a", &merged);
    outline.remove_item("b");
    outline.focus(Some("a"));

    let transition = engine.on_deferred_key(Key::Backspace).unwrap();
    assert_eq!(transition.to, ItemId::from("a"));
    assert_eq!(engine.dom().text_content(&a), "area $\\pi r^2$plain text");
    assert!(engine.dom().descendants_with_class(&a, KATEX_CLASS).is_empty());
    assert!(!shows_rendered(&engine, a));
}

#[test]
fn backspace_restores_math_rendered_in_place() {
    let outline = fixture();
    outline.focus(Some("b"));
    let mut engine = engine(&outline);
    let a = outline.name_element("a").unwrap();
    // Leftover in-place rendering inside the host element.
    MathmlRenderer.render(outline.dom(), &a, &RenderOptions::default());
    assert_eq!(engine.dom().descendants_with_class(&a, KATEX_CLASS).len(), 1);

    engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(0));
    assert!(engine.dom().descendants_with_class(&a, KATEX_CLASS).is_empty());
    assert_eq!(engine.dom().text_content(&a), "area $\\pi r^2$");
}

#[test]
fn backspace_elsewhere_does_nothing() {
    let outline = fixture();
    outline.focus(Some("b"));
    let mut engine = engine(&outline);
    engine.render_all();
    let a = outline.name_element("a").unwrap();

    assert!(!engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(2).in_item("b")));
    assert!(!engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(0).in_item("a")));
    assert!(shows_rendered(&engine, a));
}

#[test]
fn declined_merge_renders_previous_again() {
    let outline = fixture();
    outline.focus(Some("b"));
    let mut engine = engine(&outline);
    engine.render_all();
    let a = outline.name_element("a").unwrap();

    assert!(engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(0).in_item("b")));
    assert!(container(&engine, a).is_none());

    // Host keeps both items and the cursor stays in B.
    assert_eq!(engine.on_deferred_key(Key::Backspace), None);
    assert!(shows_rendered(&engine, a));
    assert_eq!(engine.dom().text_content(&a), "area $\\pi r^2$");
    assert_eq!(engine.focus_state().current(), Some(&ItemId::from("b")));

    // Nothing left pending for later ticks.
    assert_eq!(engine.on_deferred_key(Key::Other), None);
    assert_eq!(containers_in(engine.dom()), 2);
}

#[test]
fn backspace_at_start_of_note_leaves_previous_rendered() {
    let outline = fixture();
    outline.set_note("b", "details");
    outline.focus(Some("b"));
    let mut engine = engine(&outline);
    engine.render_all();
    let a = outline.name_element("a").unwrap();

    let input = KeyInput::new(Key::Backspace)
        .at_offset(0)
        .in_item("b")
        .in_content(ContentKind::Note);
    assert!(!engine.on_key_down(&input));
    assert!(shows_rendered(&engine, a));
}

#[test]
fn enter_rerenders_the_split_item() {
    let outline = fixture();
    let mut engine = engine(&outline);
    engine.render_all();

    // Cursor was in `c` as far as the host is concerned, but the engine
    // never saw that move.
    outline.set_text("c", "sum $$\\sum_i i$$ and");
    let n = outline.insert_after("c", "n", "more $y$").unwrap();
    outline.focus(Some("n"));

    let transition = engine.on_deferred_key(Key::Enter).unwrap();
    assert_eq!(transition.to, ItemId::from("n"));
    assert_eq!(transition.rerender, vec![ItemId::from("c"), ItemId::from("a")]);
    assert_eq!(engine.focus_state().previous(), Some(&ItemId::from("c")));

    assert!(shows_rendered(&engine, outline.name_element("a").unwrap()));
    assert!(shows_rendered(&engine, outline.name_element("c").unwrap()));
    assert!(!shows_rendered(&engine, outline.name_element("n").unwrap()));

    // The batch for the new item arrives late and changes nothing.
    let html = outline.dom().to_html(outline.dom().body());
    let outcome = engine.on_mutations(&[MutationRecord::new(outline.dom().body(), vec![n])]);
    assert_eq!(outcome.transition, None);
    assert_eq!(outline.dom().to_html(outline.dom().body()), html);
}

#[test]
fn missing_host_state_is_a_no_op() {
    let outline = fixture();
    outline.focus(None);
    let mut engine = engine(&outline);
    engine.render_all();
    let html = outline.dom().to_html(outline.dom().body());

    assert!(engine.on_focus_change().is_none());
    assert!(!engine.on_key_down(&KeyInput::new(Key::Backspace).at_offset(0)));
    assert_eq!(engine.sync_item(&ItemId::from("missing")), 0);
    assert_eq!(outline.dom().to_html(outline.dom().body()), html);
}

#[test]
fn clicking_rendered_math_starts_editing() {
    let outline = fixture();
    let mut engine = engine(&outline);
    engine.render_all();
    let c = outline.name_element("c").unwrap();
    let rendered = container(&engine, c).unwrap();

    outline.dom().click(rendered);
    assert_eq!(outline.dom().focused_node(), Some(c));
    assert!(!shows_rendered(&engine, c));
    assert!(outline.item_element(&ItemId::from("c")).is_some());
}

#[test]
fn restore_all_returns_host_markup() {
    let outline = MemoryOutline::new(&MemoryDom::new());
    let a = outline.add_item("a", "$x$");
    let mut engine = engine(&outline);
    engine.render_all();
    assert_eq!(containers_in(outline.dom()), 1);

    engine.restore_all();
    insta::assert_snapshot!(
        outline.dom().to_html(a),
        @r#"<div class="project" projectid="a"><div class="name"><div class="content">$x$</div></div><div class="children"></div></div>"#
    );
}
