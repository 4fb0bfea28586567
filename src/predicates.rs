//! Symbolic propositions derived from simulator snapshots.
//!
//! The [`PredicateLibrary`] turns the objects, agent and action of one step into a [`State`]: the
//! set of every [`Proposition`] that holds in that step. Derivation looks at nothing but its three
//! inputs, so the same snapshot always produces the same state regardless of object order.

use std::collections::btree_set::{self, BTreeSet};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::config::MonitorConfig;
use crate::geometry::{is_above, is_below, is_inside, is_near, is_on_top, Body, BoundingBox};
use crate::snapshot::{ActionEvent, AgentSnapshot, ObjectSnapshot};
use crate::timeline::Timeline;
use crate::trace::Trace;
use crate::Formula;

pub mod overload;

pub use overload::{ContentCount, OverloadPolicy};

/// Identifier under which the agent takes part in relations.
pub const AGENT: &str = "Agent";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateKind {
    Held,
    IsOn,
    IsOff,
    IsOpen,
    IsClosed,
    IsHot,
    IsCold,
    IsBroken,
    IsCooked,
    IsDirty,
    IsSliced,
    IsFilled,
    Above,
    Below,
    Near,
    Close,
    Inside,
    OnTop,
    IsNotMicrowaveMaterial,
    Overload,
    Collision,

    /// A predicate the library never derives. Atoms over it are always false.
    Other(String),
}

impl PredicateKind {
    /// Look up a predicate by name, ignoring case and resolving the `IN`, `HOLDING`, `ON` and `OFF`
    /// aliases.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_uppercase();

        match name.as_str() {
            "HELD" | "HOLDING" => Self::Held,
            "ISON" | "ON" => Self::IsOn,
            "ISOFF" | "OFF" => Self::IsOff,
            "ISOPEN" => Self::IsOpen,
            "ISCLOSED" => Self::IsClosed,
            "ISHOT" => Self::IsHot,
            "ISCOLD" => Self::IsCold,
            "ISBROKEN" => Self::IsBroken,
            "ISCOOKED" => Self::IsCooked,
            "ISDIRTY" => Self::IsDirty,
            "ISSLICED" => Self::IsSliced,
            "ISFILLED" => Self::IsFilled,
            "ABOVE" => Self::Above,
            "BELOW" => Self::Below,
            "NEAR" => Self::Near,
            "CLOSE" => Self::Close,
            "INSIDE" | "IN" => Self::Inside,
            "ONTOP" => Self::OnTop,
            "ISNOTMICROWAVEMATERIAL" => Self::IsNotMicrowaveMaterial,
            "OVERLOAD" => Self::Overload,
            "COLLISION" => Self::Collision,
            _ => Self::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Held => "HELD",
            Self::IsOn => "ISON",
            Self::IsOff => "ISOFF",
            Self::IsOpen => "ISOPEN",
            Self::IsClosed => "ISCLOSED",
            Self::IsHot => "ISHOT",
            Self::IsCold => "ISCOLD",
            Self::IsBroken => "ISBROKEN",
            Self::IsCooked => "ISCOOKED",
            Self::IsDirty => "ISDIRTY",
            Self::IsSliced => "ISSLICED",
            Self::IsFilled => "ISFILLED",
            Self::Above => "ABOVE",
            Self::Below => "BELOW",
            Self::Near => "NEAR",
            Self::Close => "CLOSE",
            Self::Inside => "INSIDE",
            Self::OnTop => "ONTOP",
            Self::IsNotMicrowaveMaterial => "ISNOTMICROWAVEMATERIAL",
            Self::Overload => "OVERLOAD",
            Self::Collision => "COLLISION",
            Self::Other(name) => name,
        }
    }
}

impl Display for PredicateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PredicateKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// A ground fact: a predicate applied to an ordered list of type names.
///
/// ```
/// use hearth::predicates::{PredicateKind, Proposition};
///
/// let fact = Proposition::binary(PredicateKind::Inside, "Egg", "Fridge");
/// assert_eq!(fact.to_string(), "INSIDE(Egg, Fridge)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Proposition {
    pub kind: PredicateKind,
    pub args: Vec<String>,
}

impl Proposition {
    pub fn new<I, S>(kind: PredicateKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unary(kind: PredicateKind, subject: &str) -> Self {
        Self::new(kind, [subject])
    }

    pub fn binary(kind: PredicateKind, subject: &str, object: &str) -> Self {
        Self::new(kind, [subject, object])
    }
}

impl Display for Proposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.args.join(", "))
    }
}

impl Formula<State> for Proposition {
    type Metric = bool;
    type Error = Infallible;

    fn evaluate(&self, trace: &Trace<State>) -> Result<Timeline<Self::Metric>, Self::Error> {
        let timeline = trace
            .states()
            .enumerate()
            .map(|(index, state)| (index, state.contains(self)))
            .collect();

        Ok(timeline)
    }
}

/// The set of propositions true at one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State(BTreeSet<Proposition>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, proposition: &Proposition) -> bool {
        self.0.contains(proposition)
    }

    pub fn insert(&mut self, proposition: Proposition) -> bool {
        self.0.insert(proposition)
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Proposition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Proposition> for State {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Proposition>,
    {
        Self(BTreeSet::from_iter(iter))
    }
}

impl Extend<Proposition> for State {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Proposition>,
    {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = &'a Proposition;
    type IntoIter = btree_set::Iter<'a, Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;

        for (index, proposition) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            write!(f, "{}", proposition)?;
        }

        write!(f, "}}")
    }
}

/// An object or the agent, named by its type for the propositions it appears in.
struct Participant<'a> {
    name: &'a str,
    body: Body<'a>,
}

/// Derives the [`State`] of a step from its snapshots.
#[derive(Debug, Clone, Default)]
pub struct PredicateLibrary<P = ContentCount> {
    config: MonitorConfig,
    policy: P,
}

impl PredicateLibrary<ContentCount> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_policy(config, ContentCount)
    }
}

impl<P> PredicateLibrary<P>
where
    P: OverloadPolicy,
{
    pub fn with_policy(config: MonitorConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Compute every proposition that holds for the given objects, agent and action.
    pub fn derive_state(
        &self,
        objects: &[ObjectSnapshot],
        agent: &AgentSnapshot,
        event: &ActionEvent<'_>,
    ) -> State {
        let mut state = State::new();

        for object in objects {
            self.object_state(object, agent, &mut state);
        }

        let agent_box = agent
            .position
            .map(|position| BoundingBox::around(position, self.config.geometry.agent_half_extents));

        let participants: Vec<Participant<'_>> = objects
            .iter()
            .map(|object| Participant {
                name: &object.object_type,
                body: Body {
                    id: &object.id,
                    bounds: object.bounds.as_ref(),
                    contents: &object.contents,
                    parents: &object.parents,
                },
            })
            .chain(std::iter::once(Participant {
                name: AGENT,
                body: Body {
                    id: AGENT,
                    bounds: agent_box.as_ref(),
                    contents: &[],
                    parents: &[],
                },
            }))
            .collect();

        for (index, first) in participants.iter().enumerate() {
            for second in &participants[index + 1..] {
                self.relate(first, second, &mut state);
                self.relate(second, first, &mut state);
            }
        }

        if self.is_collision(event) {
            state.insert(Proposition::unary(PredicateKind::Collision, AGENT));
        }

        state
    }

    fn object_state(&self, object: &ObjectSnapshot, agent: &AgentSnapshot, state: &mut State) {
        let capabilities = &object.capabilities;
        let values = &object.values;
        let predicates = &self.config.predicates;

        let flags = [
            (PredicateKind::Held, agent.holds(&object.id)),
            (PredicateKind::IsOn, capabilities.toggleable && values.is_toggled),
            (PredicateKind::IsOff, capabilities.toggleable && !values.is_toggled),
            (PredicateKind::IsOpen, capabilities.openable && values.is_open),
            (PredicateKind::IsClosed, capabilities.openable && !values.is_open),
            (PredicateKind::IsHot, values.temperature_is("hot")),
            (PredicateKind::IsCold, values.temperature_is("cold")),
            (PredicateKind::IsBroken, values.is_broken),
            (PredicateKind::IsCooked, values.is_cooked),
            (PredicateKind::IsDirty, values.is_dirty),
            (PredicateKind::IsSliced, values.is_sliced),
            (PredicateKind::IsFilled, values.is_filled_with_liquid),
            (
                PredicateKind::IsNotMicrowaveMaterial,
                predicates.microwave_denylist.contains(&object.object_type),
            ),
            (PredicateKind::Overload, self.policy.is_overloaded(object, predicates)),
        ];

        let names = predicates.type_names(&object.object_type);

        for (kind, _) in flags.into_iter().filter(|(_, holds)| *holds) {
            state.extend(names.iter().map(|name| Proposition::unary(kind.clone(), name)));
        }
    }

    fn relate(&self, subject: &Participant<'_>, object: &Participant<'_>, state: &mut State) {
        let geometry = &self.config.geometry;
        let fact = |kind| Proposition::binary(kind, subject.name, object.name);

        let (Some(a), Some(b)) = (subject.body.bounds, object.body.bounds) else {
            return;
        };

        if is_inside(&subject.body, &object.body, geometry) {
            state.insert(fact(PredicateKind::Inside));
        }

        if is_above(a, b, geometry) {
            state.insert(fact(PredicateKind::Above));
        }

        if is_below(a, b, geometry) {
            state.insert(fact(PredicateKind::Below));
        }

        if is_near(a, b, geometry) {
            state.insert(fact(PredicateKind::Near));
            state.insert(fact(PredicateKind::Close));
        }

        if is_on_top(a, b, geometry) {
            state.insert(fact(PredicateKind::OnTop));
        }
    }

    fn is_collision(&self, event: &ActionEvent<'_>) -> bool {
        if event.success {
            return false;
        }

        match (event.action_name(), event.error) {
            (Some(action), Some(error)) => self.config.predicates.collision.matches(action, error),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PredicateKind, PredicateLibrary, Proposition, State, AGENT};
    use crate::config::MonitorConfig;
    use crate::geometry::{BoundingBox, Point3};
    use crate::snapshot::{ActionCommand, ActionEvent, AgentSnapshot, ObjectSnapshot};

    type Corner = (f64, f64, f64);

    fn placed(id: &str, object_type: &str, min: Corner, max: Corner) -> ObjectSnapshot {
        let mut object = ObjectSnapshot::new(id, object_type);
        object.bounds = Some(BoundingBox::new(
            Point3::new(min.0, min.1, min.2),
            Point3::new(max.0, max.1, max.2),
        ));
        object
    }

    fn kitchen() -> Vec<ObjectSnapshot> {
        let mut stove = placed("StoveBurner|1", "StoveBurner", (0.0, 0.0, 0.0), (0.5, 0.9, 0.5));
        stove.capabilities.toggleable = true;
        stove.values.is_toggled = true;
        stove.values.temperature = Some("Hot".to_string());

        let mut fridge = placed("Fridge|1", "Fridge", (3.0, 0.0, 0.0), (4.0, 2.0, 1.0));
        fridge.capabilities.openable = true;
        fridge.capabilities.receptacle = true;
        fridge.contents = vec!["Egg|1".to_string()];

        let pan = placed("Pan|1", "Pan", (0.1, 0.95, 0.1), (0.4, 1.05, 0.4));
        let egg = placed("Egg|1", "Egg", (3.2, 0.5, 0.2), (3.3, 0.6, 0.3));

        vec![stove, fridge, pan, egg]
    }

    fn derive(objects: &[ObjectSnapshot], agent: &AgentSnapshot) -> State {
        let library = PredicateLibrary::new(MonitorConfig::default());
        library.derive_state(objects, agent, &ActionEvent::default())
    }

    #[test]
    fn predicate_names() {
        assert_eq!(PredicateKind::from_name("in"), PredicateKind::Inside);
        assert_eq!(PredicateKind::from_name("Holding"), PredicateKind::Held);
        assert_eq!(PredicateKind::from_name("ON"), PredicateKind::IsOn);
        assert_eq!(PredicateKind::from_name("off"), PredicateKind::IsOff);
        assert_eq!(
            PredicateKind::from_name("isNotMicrowaveMaterial"),
            PredicateKind::IsNotMicrowaveMaterial
        );
        assert_eq!(
            PredicateKind::from_name("smoking"),
            PredicateKind::Other("SMOKING".to_string())
        );
        assert_eq!(PredicateKind::Inside.to_string(), "INSIDE");
    }

    #[test]
    fn state_predicates() {
        let state = derive(&kitchen(), &AgentSnapshot::default());

        assert!(state.contains(&Proposition::unary(PredicateKind::IsOn, "StoveBurner")));
        assert!(!state.contains(&Proposition::unary(PredicateKind::IsOff, "StoveBurner")));
        assert!(state.contains(&Proposition::unary(PredicateKind::IsHot, "StoveBurner")));
        assert!(state.contains(&Proposition::unary(PredicateKind::IsClosed, "Fridge")));
        assert!(!state.contains(&Proposition::unary(PredicateKind::IsOpen, "Fridge")));
        assert!(!state.contains(&Proposition::unary(PredicateKind::IsOff, "Pan")));
        assert!(state.contains(&Proposition::unary(PredicateKind::IsNotMicrowaveMaterial, "Pan")));
        assert!(!state.contains(&Proposition::unary(PredicateKind::IsNotMicrowaveMaterial, "Egg")));
    }

    #[test]
    fn held_is_inventory_membership() {
        let agent = AgentSnapshot {
            position: None,
            inventory: ["Egg|1".to_string()].into_iter().collect(),
        };
        let state = derive(&kitchen(), &agent);

        assert!(state.contains(&Proposition::unary(PredicateKind::Held, "Egg")));
        assert!(!state.contains(&Proposition::unary(PredicateKind::Held, "Pan")));
    }

    #[test]
    fn relations_keep_argument_order() {
        let state = derive(&kitchen(), &AgentSnapshot::default());

        assert!(state.contains(&Proposition::binary(PredicateKind::OnTop, "Pan", "StoveBurner")));
        assert!(!state.contains(&Proposition::binary(PredicateKind::OnTop, "StoveBurner", "Pan")));
        assert!(state.contains(&Proposition::binary(PredicateKind::Inside, "Egg", "Fridge")));
        assert!(!state.contains(&Proposition::binary(PredicateKind::Inside, "Fridge", "Egg")));
        assert!(state.contains(&Proposition::binary(PredicateKind::Near, "Pan", "StoveBurner")));
        assert!(state.contains(&Proposition::binary(PredicateKind::Near, "StoveBurner", "Pan")));
    }

    #[test]
    fn inside_needs_both_boxes() {
        let mut objects = kitchen();
        let inside = Proposition::binary(PredicateKind::Inside, "Egg", "Fridge");

        objects[3] = ObjectSnapshot::new("Egg|1", "Egg");
        assert!(!derive(&objects, &AgentSnapshot::default()).contains(&inside));

        objects[3] = placed("Egg|1", "Egg", (8.0, 0.0, 8.0), (8.1, 0.1, 8.1));
        assert!(derive(&objects, &AgentSnapshot::default()).contains(&inside));
    }

    #[test]
    fn type_families_share_state() {
        let mut bottle = ObjectSnapshot::new("WineBottle|1", "WineBottle");
        bottle.capabilities.can_fill_with_liquid = true;
        bottle.values.is_filled_with_liquid = true;

        let agent = AgentSnapshot {
            position: None,
            inventory: ["WineBottle|1".to_string()].into_iter().collect(),
        };
        let state = derive(&[bottle], &agent);

        for name in ["WineBottle", "Bottle"] {
            assert!(state.contains(&Proposition::unary(PredicateKind::Held, name)));
            assert!(state.contains(&Proposition::unary(PredicateKind::IsFilled, name)));
        }

        assert!(!state.contains(&Proposition::unary(PredicateKind::Held, "Cup")));
    }

    #[test]
    fn close_iff_near() {
        let state = derive(&kitchen(), &AgentSnapshot::default());

        for proposition in &state {
            let twin = match proposition.kind {
                PredicateKind::Near => PredicateKind::Close,
                PredicateKind::Close => PredicateKind::Near,
                _ => continue,
            };

            assert!(state.contains(&Proposition::new(twin, proposition.args.clone())));
        }

        assert!(state.iter().any(|p| p.kind == PredicateKind::Close));
    }

    #[test]
    fn agent_takes_part_in_relations() {
        let agent = AgentSnapshot {
            position: Some(Point3::new(0.25, 0.9, -0.5)),
            inventory: Default::default(),
        };
        let state = derive(&kitchen(), &agent);

        assert!(state.contains(&Proposition::binary(PredicateKind::Near, AGENT, "StoveBurner")));
        assert!(!state.contains(&Proposition::binary(PredicateKind::Near, AGENT, "Fridge")));
    }

    #[test]
    fn derivation_is_order_independent_and_idempotent() {
        let objects = kitchen();
        let mut reversed = objects.clone();
        reversed.reverse();

        let agent = AgentSnapshot::default();
        let first = derive(&objects, &agent);

        assert_eq!(first, derive(&objects, &agent));
        assert_eq!(first, derive(&reversed, &agent));
    }

    #[test]
    fn collision_from_action_error() {
        let library = PredicateLibrary::new(MonitorConfig::default());
        let open = ActionCommand {
            action: Some("OpenObject".to_string()),
            ..Default::default()
        };
        let collision = Proposition::unary(PredicateKind::Collision, AGENT);
        let derive = |success, error| {
            let event = ActionEvent {
                attempted: None,
                executed: Some(&open),
                success,
                error,
            };

            library.derive_state(&[], &AgentSnapshot::default(), &event)
        };

        assert!(derive(false, Some("Fridge|1 is blocked")).contains(&collision));
        assert!(!derive(false, Some("Object not visible")).contains(&collision));
        assert!(!derive(false, None).contains(&collision));
        assert!(!derive(true, Some("Fridge|1 is blocked")).contains(&collision));
    }

    #[test]
    fn state_display() {
        let state: State = [
            Proposition::unary(PredicateKind::IsOn, "Microwave"),
            Proposition::binary(PredicateKind::Inside, "Egg", "Fridge"),
        ]
        .into_iter()
        .collect();

        assert_eq!(state.to_string(), "{ISON(Microwave), INSIDE(Egg, Fridge)}");
    }
}
