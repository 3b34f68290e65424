//! Fan-out of one operation over several lists or items.
//!
//! A [`MenuHandler`] is an ordered set of [`Target`]s. Dispatching an
//! [`Operation`] runs it on every target in order and combines the per-target
//! results according to the operation's [`Aggregation`]:
//!
//! | Aggregation  | Operations                          | Response              |
//! |--------------|-------------------------------------|-----------------------|
//! | `Mutate`     | push, attach, setters, prefixes     | the same handler      |
//! | `Flatten`    | all items/lists, depth queries      | handler over results  |
//! | `FirstMatch` | find by name/url/attribute, active  | first hit, if any     |
//! | `Concat`     | render                              | joined markup         |
//! | `KeyGrouped` | items/lists with depth              | merged depth map      |
//!
//! Targets are plain handles, so a handler never borrows the tree; every
//! dispatch takes it explicitly. An error on any target aborts the dispatch
//! and is returned as is. Targets already processed keep their changes.
//!
//! Operations on an item target act on the item's children where the
//! operation is about lists (flattening, finding), and on the item itself
//! otherwise (rendering, element, attributes, active patterns).

use crate::attributes::AttributeSet;
use crate::content::ContentKind;
use crate::error::MenuError;
use crate::render::{render_item, render_list_at};
use crate::request::Location;
use crate::tree::{ItemId, ListId, MenuTree, NewItem};
use maud::{Markup, PreEscaped};
use std::collections::BTreeMap;

/// One list or item a handler dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    List(ListId),
    Item(ItemId),
}

impl Target {
    pub fn as_list(self) -> Option<ListId> {
        match self {
            Self::List(list) => Some(list),
            Self::Item(_) => None,
        }
    }

    pub fn as_item(self) -> Option<ItemId> {
        match self {
            Self::Item(item) => Some(item),
            Self::List(_) => None,
        }
    }
}

/// How per-target results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mutate,
    Flatten,
    FirstMatch,
    Concat,
    KeyGrouped,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Push(NewItem),
    Attach(ListId),
    SetName(Option<String>),
    SetElement(Option<String>),
    SetAttributes(AttributeSet),
    AddClass(String),
    Prefix(String),
    PrefixParents(bool),
    PrefixHandler(bool),
    MaxDepth(Option<usize>),
    ActivePattern(String),
    Render(Location),
    AllItems,
    ItemsAtDepth(usize),
    ItemsAtDepthRange(usize, usize),
    ItemsByContentType(ContentKind),
    AllItemLists,
    ItemListsAtDepth(usize),
    ItemListsAtDepthRange(usize, usize),
    FindByName(String),
    FindItemByUrl(String),
    FindItemByAttribute(String, String),
    FindActiveItem(Location),
    ItemsWithDepth,
    ItemListsWithDepth,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Attach(_) => "attach",
            Self::SetName(_) => "set_name",
            Self::SetElement(_) => "set_element",
            Self::SetAttributes(_) => "set_attributes",
            Self::AddClass(_) => "add_class",
            Self::Prefix(_) => "prefix",
            Self::PrefixParents(_) => "prefix_parents",
            Self::PrefixHandler(_) => "prefix_handler",
            Self::MaxDepth(_) => "max_depth",
            Self::ActivePattern(_) => "active_pattern",
            Self::Render(_) => "render",
            Self::AllItems => "all_items",
            Self::ItemsAtDepth(_) => "items_at_depth",
            Self::ItemsAtDepthRange(..) => "items_at_depth_range",
            Self::ItemsByContentType(_) => "items_by_content_type",
            Self::AllItemLists => "all_item_lists",
            Self::ItemListsAtDepth(_) => "item_lists_at_depth",
            Self::ItemListsAtDepthRange(..) => "item_lists_at_depth_range",
            Self::FindByName(_) => "find_item_list_by_name",
            Self::FindItemByUrl(_) => "find_item_by_url",
            Self::FindItemByAttribute(..) => "find_item_by_attribute",
            Self::FindActiveItem(_) => "find_active_item",
            Self::ItemsWithDepth => "items_with_depth",
            Self::ItemListsWithDepth => "item_lists_with_depth",
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Self::Push(_)
            | Self::Attach(_)
            | Self::SetName(_)
            | Self::SetElement(_)
            | Self::SetAttributes(_)
            | Self::AddClass(_)
            | Self::Prefix(_)
            | Self::PrefixParents(_)
            | Self::PrefixHandler(_)
            | Self::MaxDepth(_)
            | Self::ActivePattern(_) => Aggregation::Mutate,
            Self::Render(_) => Aggregation::Concat,
            Self::AllItems
            | Self::ItemsAtDepth(_)
            | Self::ItemsAtDepthRange(..)
            | Self::ItemsByContentType(_)
            | Self::AllItemLists
            | Self::ItemListsAtDepth(_)
            | Self::ItemListsAtDepthRange(..) => Aggregation::Flatten,
            Self::FindByName(_)
            | Self::FindItemByUrl(_)
            | Self::FindItemByAttribute(..)
            | Self::FindActiveItem(_) => Aggregation::FirstMatch,
            Self::ItemsWithDepth | Self::ItemListsWithDepth => Aggregation::KeyGrouped,
        }
    }
}

/// Combined result of a dispatch.
#[derive(Debug, Clone)]
pub enum Response {
    /// The handler itself after a mutation, or a new one over flattened results.
    Handler(MenuHandler),
    Match(Option<Target>),
    Markup(Markup),
    Depths(BTreeMap<usize, Vec<Target>>),
}

impl Response {
    pub fn into_handler(self) -> Option<MenuHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn into_match(self) -> Option<Target> {
        match self {
            Self::Match(target) => target,
            _ => None,
        }
    }

    pub fn into_markup(self) -> Option<Markup> {
        match self {
            Self::Markup(markup) => Some(markup),
            _ => None,
        }
    }

    pub fn into_depths(self) -> Option<BTreeMap<usize, Vec<Target>>> {
        match self {
            Self::Depths(depths) => Some(depths),
            _ => None,
        }
    }
}

/// What one target produced, before aggregation.
enum Outcome {
    Done,
    Targets(Vec<Target>),
    Match(Option<Target>),
    Markup(Markup),
    Depths(BTreeMap<usize, Vec<Target>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuHandler {
    targets: Vec<Target>,
}

impl MenuHandler {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    pub fn from_lists(lists: impl IntoIterator<Item = ListId>) -> Self {
        Self::new(lists.into_iter().map(Target::List).collect())
    }

    pub fn from_items(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self::new(items.into_iter().map(Target::Item).collect())
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// The list targets, in order.
    pub fn lists(&self) -> Vec<ListId> {
        self.targets.iter().filter_map(|t| t.as_list()).collect()
    }

    /// The item targets, in order.
    pub fn items(&self) -> Vec<ItemId> {
        self.targets.iter().filter_map(|t| t.as_item()).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Run `operation` on every target and combine the results.
    pub fn dispatch(&self, tree: &mut MenuTree, operation: Operation) -> Result<Response, MenuError> {
        self.check_handles(tree, &operation)?;
        let aggregation = operation.aggregation();
        let mut outcomes = Vec::with_capacity(self.targets.len());
        for (index, &target) in self.targets.iter().enumerate() {
            outcomes.push(apply(tree, target, &operation, index)?);
        }

        Ok(match aggregation {
            Aggregation::Mutate => Response::Handler(self.clone()),
            Aggregation::Flatten => Response::Handler(MenuHandler::new(
                outcomes
                    .into_iter()
                    .flat_map(|outcome| match outcome {
                        Outcome::Targets(targets) => targets,
                        _ => Vec::new(),
                    })
                    .collect(),
            )),
            Aggregation::FirstMatch => Response::Match(outcomes.into_iter().find_map(|outcome| {
                match outcome {
                    Outcome::Match(found) => found,
                    _ => None,
                }
            })),
            Aggregation::Concat => {
                let mut out = String::new();
                for outcome in outcomes {
                    if let Outcome::Markup(markup) = outcome {
                        out.push_str(&markup.into_string());
                    }
                }
                Response::Markup(PreEscaped(out))
            }
            Aggregation::KeyGrouped => {
                let mut merged: BTreeMap<usize, Vec<Target>> = BTreeMap::new();
                for outcome in outcomes {
                    if let Outcome::Depths(depths) = outcome {
                        for (depth, targets) in depths {
                            merged.entry(depth).or_default().extend(targets);
                        }
                    }
                }
                Response::Depths(merged)
            }
        })
    }

    /// Fail before touching the tree if any handle involved is stale.
    fn check_handles(&self, tree: &MenuTree, operation: &Operation) -> Result<(), MenuError> {
        for &target in &self.targets {
            match target {
                Target::List(list) => tree.check_list(list)?,
                Target::Item(item) => tree.check_item(item)?,
            }
        }
        match operation {
            Operation::Attach(other) => tree.check_list(*other),
            Operation::Push(new) => new.child_list().map_or(Ok(()), |c| tree.check_list(c)),
            _ => Ok(()),
        }
    }

    /// Render every target and join the markup in target order.
    pub fn render(&self, tree: &mut MenuTree, location: &Location) -> Result<Markup, MenuError> {
        let response = self.dispatch(tree, Operation::Render(location.clone()))?;
        Ok(response
            .into_markup()
            .unwrap_or_else(|| PreEscaped(String::new())))
    }

    /// Add the same link to every list target.
    pub fn add(&self, tree: &mut MenuTree, url: &str, label: &str) -> Result<&Self, MenuError> {
        self.dispatch(tree, Operation::Push(NewItem::link(url, label)))?;
        Ok(self)
    }

    /// Add the same raw markup to every list target.
    pub fn raw(&self, tree: &mut MenuTree, markup: &str) -> Result<&Self, MenuError> {
        self.dispatch(tree, Operation::Push(NewItem::raw(markup)))?;
        Ok(self)
    }
}

fn apply(
    tree: &mut MenuTree,
    target: Target,
    operation: &Operation,
    index: usize,
) -> Result<Outcome, MenuError> {
    match target {
        Target::List(list) => apply_to_list(tree, list, operation, index),
        Target::Item(item) => apply_to_item(tree, item, operation),
    }
}

fn apply_to_list(
    tree: &mut MenuTree,
    list: ListId,
    operation: &Operation,
    index: usize,
) -> Result<Outcome, MenuError> {
    let outcome = match operation {
        Operation::Push(new) => {
            let mut new = new.clone();
            // Each target owns its own copy of a shared child list.
            if index > 0 {
                if let Some(children) = new.child_list() {
                    new = new.children(tree.clone_list(children));
                }
            }
            tree.push_item(list, new)?;
            Outcome::Done
        }
        Operation::Attach(other) => {
            tree.attach(list, *other)?;
            Outcome::Done
        }
        Operation::SetName(name) => {
            tree.list_mut(list).name(name.as_deref());
            Outcome::Done
        }
        Operation::SetElement(element) => {
            tree.list_mut(list).element(element.as_deref())?;
            Outcome::Done
        }
        Operation::SetAttributes(attributes) => {
            tree.list_mut(list).attributes(attributes.clone());
            Outcome::Done
        }
        Operation::AddClass(class) => {
            tree.list_mut(list).add_class(class);
            Outcome::Done
        }
        Operation::Prefix(prefix) => {
            tree.list_mut(list).prefix(prefix);
            Outcome::Done
        }
        Operation::PrefixParents(enabled) => {
            tree.list_mut(list).prefix_parents(*enabled);
            Outcome::Done
        }
        Operation::PrefixHandler(enabled) => {
            tree.list_mut(list).prefix_handler(*enabled);
            Outcome::Done
        }
        Operation::MaxDepth(max_depth) => {
            tree.list_mut(list).max_depth(*max_depth);
            Outcome::Done
        }
        Operation::ActivePattern(_) => return Err(item_only(operation)),
        Operation::Render(location) => Outcome::Markup(render_list_at(tree, list, 0, location)),
        _ => query(tree, Some(list), operation)?,
    };
    Ok(outcome)
}

fn apply_to_item(tree: &mut MenuTree, item: ItemId, operation: &Operation) -> Result<Outcome, MenuError> {
    let outcome = match operation {
        Operation::SetElement(element) => {
            tree.item_mut(item).element(element.as_deref())?;
            Outcome::Done
        }
        Operation::SetAttributes(attributes) => {
            tree.item_mut(item).attributes(attributes.clone());
            Outcome::Done
        }
        Operation::AddClass(class) => {
            tree.item_mut(item).add_class(class);
            Outcome::Done
        }
        Operation::ActivePattern(pattern) => {
            tree.item_mut(item).active_pattern(pattern)?;
            Outcome::Done
        }
        Operation::Push(_)
        | Operation::Attach(_)
        | Operation::SetName(_)
        | Operation::Prefix(_)
        | Operation::PrefixParents(_)
        | Operation::PrefixHandler(_)
        | Operation::MaxDepth(_) => return Err(list_only(operation)),
        Operation::Render(location) => Outcome::Markup(render_item(tree, item, 1, location)),
        _ => query(tree, tree.item(item).children(), operation)?,
    };
    Ok(outcome)
}

/// Read-only operations on a list. `None` stands for an item without children.
fn query(tree: &MenuTree, list: Option<ListId>, operation: &Operation) -> Result<Outcome, MenuError> {
    let items = |found: Vec<ItemId>| Outcome::Targets(found.into_iter().map(Target::Item).collect());
    let lists = |found: Vec<ListId>| Outcome::Targets(found.into_iter().map(Target::List).collect());

    let Some(list) = list else {
        return Ok(match operation.aggregation() {
            Aggregation::Flatten => Outcome::Targets(Vec::new()),
            Aggregation::FirstMatch => Outcome::Match(None),
            Aggregation::KeyGrouped => Outcome::Depths(BTreeMap::new()),
            _ => Outcome::Done,
        });
    };

    let outcome = match operation {
        Operation::AllItems => items(tree.all_items(list)),
        Operation::ItemsAtDepth(depth) => items(tree.items_at_depth(list, *depth)?),
        Operation::ItemsAtDepthRange(from, to) => items(tree.items_at_depth_range(list, *from, *to)?),
        Operation::ItemsByContentType(kind) => items(tree.items_by_content_type(list, *kind)),
        Operation::AllItemLists => lists(tree.all_item_lists(list)),
        Operation::ItemListsAtDepth(depth) => lists(tree.item_lists_at_depth(list, *depth)?),
        Operation::ItemListsAtDepthRange(from, to) => {
            lists(tree.item_lists_at_depth_range(list, *from, *to)?)
        }
        Operation::FindByName(name) => {
            Outcome::Match(tree.find_item_list_by_name(list, name).map(Target::List))
        }
        Operation::FindItemByUrl(url) => {
            Outcome::Match(tree.find_item_by_url(list, url).map(Target::Item))
        }
        Operation::FindItemByAttribute(key, value) => {
            Outcome::Match(tree.find_item_by_attribute(list, key, value).map(Target::Item))
        }
        Operation::FindActiveItem(location) => {
            Outcome::Match(tree.find_active_item(list, location).map(Target::Item))
        }
        Operation::ItemsWithDepth => Outcome::Depths(
            tree.items_with_depth(list)
                .into_iter()
                .map(|(depth, found)| (depth, found.into_iter().map(Target::Item).collect()))
                .collect(),
        ),
        Operation::ItemListsWithDepth => Outcome::Depths(
            tree.item_lists_with_depth(list)
                .into_iter()
                .map(|(depth, found)| (depth, found.into_iter().map(Target::List).collect()))
                .collect(),
        ),
        _ => Outcome::Done,
    };
    Ok(outcome)
}

fn list_only(operation: &Operation) -> MenuError {
    MenuError::InvalidArgument(format!("{} applies to item lists only", operation.name()))
}

fn item_only(operation: &Operation) -> MenuError {
    MenuError::InvalidArgument(format!("{} applies to items only", operation.name()))
}
