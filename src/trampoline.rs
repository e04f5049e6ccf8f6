use crate::evaluator;
use crate::types::{Callable, IodeObject};

/// A call whose arguments are already evaluated but which has not run yet.
/// Only produced for expressions in tail position.
#[derive(Debug)]
pub(crate) struct TailCall {
    pub callable: Callable,
    pub args: Vec<IodeObject>,
}

impl TailCall {
    pub fn new(callable: Callable, args: Vec<IodeObject>) -> Self {
        Self { callable, args }
    }

    /// Runs the callee's body once. Another tail call in that body comes back
    /// as a fresh `Pending` instead of growing the stack.
    fn step(self) -> evaluator::Result<Reduction> {
        evaluator::invoke(&self.callable, &self.args)
    }
}

#[derive(Debug)]
pub(crate) enum Reduction {
    Value(IodeObject),
    Pending(TailCall),
}

pub(crate) fn settle(mut reduction: Reduction) -> evaluator::Result {
    let mut steps = 0usize;
    loop {
        match reduction {
            Reduction::Value(obj) => {
                if steps > 0 {
                    log::trace!("settled after {} tail calls", steps);
                }
                return Ok(obj);
            }
            Reduction::Pending(call) => {
                steps += 1;
                reduction = call.step()?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::evaluator::reduce;
    use crate::reader::read_str;

    fn root_with(source: &str) -> std::rc::Rc<Environment> {
        let env = Environment::root();
        crate::library::install_all(crate::library::STANDARD, &env);
        crate::evaluator::evaluate(&read_str(source).unwrap(), &env).unwrap();
        env
    }

    #[test]
    fn values_settle_immediately() {
        let result = settle(Reduction::Value(IodeObject::Integer(3)));
        assert_eq!(result.unwrap(), IodeObject::Integer(3));
    }

    #[test]
    fn tail_calls_are_deferred() {
        let env = root_with("(def f (func (x) x))");
        let reduction = reduce(&read_str("(f 7)").unwrap(), &env).unwrap();
        assert!(matches!(reduction, Reduction::Pending(_)));
        assert_eq!(settle(reduction).unwrap(), IodeObject::Integer(7));
    }

    #[test]
    fn primitive_calls_are_not_deferred() {
        let env = root_with("nil");
        let reduction = reduce(&read_str("(+ 1 2)").unwrap(), &env).unwrap();
        assert!(matches!(reduction, Reduction::Value(IodeObject::Integer(3))));
    }

    #[test]
    fn chains_run_in_constant_stack() {
        let env = root_with(
            "(def loop (func (n acc) (if (= n 0) acc (loop (- n 1) (+ acc 1)))))",
        );
        let reduction = reduce(&read_str("(loop 200000 0)").unwrap(), &env).unwrap();
        assert_eq!(settle(reduction).unwrap(), IodeObject::Integer(200000));
    }
}
