//! UI tree generation
//!
//! Pure function of the element tree. Repeatable leaves are wrapped in an
//! array container holding one non-repeatable stamp of the same element;
//! repeatable groups are wrapped whole, since one repetition is one full
//! sub-form. Declared lists render their item template as the stamp.

use crate::component::ComponentKind;
use crate::node::{ArrayProps, DisplayProps, UiNode, UiTree, Variant};
use smt_model::{lang_text, ElementKind, ElementTree, TemplateElement, DEFAULT_LANGUAGE};

/// Text longer than this renders as a text area
pub const DEFAULT_TEXT_AREA_THRESHOLD: usize = 255;

/// Depth from which groups start collapsed
pub const COLLAPSE_DEPTH: usize = 2;

/// UI tree generator
#[derive(Debug, Clone, Copy)]
pub struct UiGenerator {
    text_area_threshold: usize,
}

impl Default for UiGenerator {
    fn default() -> Self {
        Self {
            text_area_threshold: DEFAULT_TEXT_AREA_THRESHOLD,
        }
    }
}

impl UiGenerator {
    /// Create generator with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum length above which text renders as a text area
    #[must_use]
    pub fn with_text_area_threshold(mut self, threshold: usize) -> Self {
        self.text_area_threshold = threshold;
        self
    }

    /// Generate the UI tree
    #[must_use]
    pub fn generate(&self, tree: &ElementTree) -> UiTree {
        let header = &tree.header;
        let label = lang_text(&header.display_name, DEFAULT_LANGUAGE)
            .unwrap_or(&header.id_short)
            .to_string();

        let root = UiNode {
            component: ComponentKind::Form,
            key: String::new(),
            depth: 0,
            props: DisplayProps {
                label,
                description: lang_text(&header.description, DEFAULT_LANGUAGE).map(ToString::to_string),
                examples: Vec::new(),
                required: false,
                read_only: false,
                choices: Vec::new(),
                default_collapsed: false,
                variant: Variant::Primary,
            },
            array: None,
            children: tree.roots().iter().map(|e| self.render(e, 0)).collect(),
        };

        let ui = UiTree { root };
        tracing::debug!("Generated UI tree with {} nodes", ui.len());
        ui
    }

    fn render(&self, element: &TemplateElement, depth: usize) -> UiNode {
        if element.repeatable && element.kind != ElementKind::SubmodelElementList {
            let stamp = self.render_instance(element, depth + 1, true);
            return array_container(element, depth, vec![stamp]);
        }
        self.render_instance(element, depth, false)
    }

    /// Render one occurrence; `stamp` clears required-ness, which then
    /// lives on the enclosing container
    fn render_instance(&self, element: &TemplateElement, depth: usize, stamp: bool) -> UiNode {
        if element.kind == ElementKind::SubmodelElementList {
            let item = element
                .item_template()
                .map(|item| self.render_instance(item, depth + 1, true));
            return array_container(element, depth, item.into_iter().collect());
        }

        let component = self.component_for(element);
        let children = match element.kind {
            ElementKind::SubmodelElementCollection | ElementKind::Entity => element
                .children
                .iter()
                .map(|child| self.render(child, depth + 1))
                .collect(),
            _ => Vec::new(),
        };

        UiNode {
            component,
            key: element.key(),
            depth,
            props: display_props(element, component, depth, element.required && !stamp),
            array: None,
            children,
        }
    }

    fn component_for(&self, element: &TemplateElement) -> ComponentKind {
        let base = ComponentKind::for_input(element.input_kind);
        let constraints = &element.constraints;
        match base {
            ComponentKind::TextField | ComponentKind::IntegerField | ComponentKind::DecimalField
                if !constraints.allowed_values.is_empty() =>
            {
                ComponentKind::Select
            }
            ComponentKind::TextField
                if constraints
                    .max_length
                    .is_some_and(|max| max > self.text_area_threshold) =>
            {
                ComponentKind::TextArea
            }
            other => other,
        }
    }
}

/// Generate the UI tree with the default generator
#[must_use]
pub fn generate(tree: &ElementTree) -> UiTree {
    UiGenerator::new().generate(tree)
}

fn array_container(element: &TemplateElement, depth: usize, children: Vec<UiNode>) -> UiNode {
    let props = display_props(element, ComponentKind::ArrayContainer, depth, element.required);
    let add_label = format!("Add {}", props.label);
    UiNode {
        component: ComponentKind::ArrayContainer,
        key: element.key(),
        depth,
        props,
        array: Some(ArrayProps {
            min_items: element.min_items(),
            add_label,
        }),
        children,
    }
}

fn display_props(
    element: &TemplateElement,
    component: ComponentKind,
    depth: usize,
    required: bool,
) -> DisplayProps {
    DisplayProps {
        label: element.label().to_string(),
        description: element.help_text().map(ToString::to_string),
        examples: element.examples.clone(),
        required,
        read_only: element.read_only,
        choices: element.constraints.allowed_values.clone(),
        default_collapsed: component.is_container() && depth >= COLLAPSE_DEPTH,
        variant: Variant::for_depth(depth),
    }
}
