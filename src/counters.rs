/// Best (lowest) value observed per metric during one task execution.
///
/// Replays of a measured task all write into the same instance, so the stored value is the
/// minimum of every reading. Order of `values()` is first-insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    values: Vec<(String, u64)>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `name` if nothing is stored yet or if it is strictly lower.
    /// `None` is ignored.
    pub fn set(&mut self, name: &str, value: Option<u64>) -> &mut Self {
        let Some(value) = value else {
            return self;
        };
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, current)) => {
                if value < *current {
                    *current = value;
                }
            }
            None => self.values.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
