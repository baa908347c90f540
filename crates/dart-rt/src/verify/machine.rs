//! Bounded stack machine replaying a proof against a credential store.

use crate::error::{DartError, Result};
use crate::expression::{Expression, ExpressionId};
use crate::principal::Principal;
use crate::proof::ProofStep;
use crate::store::CredentialStore;

use super::VerifiedMembership;

#[derive(Debug, Clone)]
enum Slot {
    /// `member` is proven to belong to `expr`.
    Proven {
        expr: Expression,
        id: ExpressionId,
        member: Principal,
    },
    /// One side of an intersection is proven for `member`.
    Half {
        id: ExpressionId,
        side: ExpressionId,
        member: Principal,
    },
}

pub(crate) struct StackMachine<'s, S: CredentialStore + ?Sized> {
    store: &'s S,
    stack: Vec<Slot>,
    limit: usize,
}

impl<'s, S: CredentialStore + ?Sized> StackMachine<'s, S> {
    pub(crate) fn new(store: &'s S, limit: usize) -> Self {
        Self {
            store,
            stack: Vec::with_capacity(limit),
            limit,
        }
    }

    pub(crate) fn step(&mut self, step: &ProofStep) -> Result<()> {
        let to = self.lookup(&step.to)?;
        let from = self.lookup(&step.from)?;

        let member = match &from {
            Expression::SimpleMember { member } => {
                self.push(Slot::Proven {
                    expr: from.clone(),
                    id: step.from.clone(),
                    member: member.clone(),
                })?;
                self.pop_proven(&step.from)?
            }
            Expression::LinkedInclusion {
                principal,
                role_a,
                role_b,
            } => {
                let via = self.pop_proven(&Expression::of_role(principal, role_a).id())?;
                self.pop_proven(&Expression::of_role(&via, role_b).id())?
            }
            _ => self.pop_proven(&step.from)?,
        };

        match to {
            Expression::SimpleInclusion { .. } => {
                match self.store.find_credential(&step.to, &step.from) {
                    Some(credential) if credential.weight > 0 => {}
                    Some(_) => {
                        return Err(DartError::invalid_proof(format!(
                            "credential {to} ←- {from} has been revoked"
                        )))
                    }
                    None => {
                        return Err(DartError::invalid_proof(format!(
                            "no credential {to} ←- {from}"
                        )))
                    }
                }
                self.push(Slot::Proven {
                    expr: to,
                    id: step.to.clone(),
                    member,
                })
            }
            Expression::IntersectionInclusion { .. } => {
                self.intersect(to, &step.to, &from, &step.from, member)
            }
            other => Err(DartError::invalid_proof(format!(
                "{other} cannot be the destination of a proof step"
            ))),
        }
    }

    pub(crate) fn finish(mut self) -> Result<VerifiedMembership> {
        if self.stack.len() != 1 {
            return Err(DartError::invalid_proof(format!(
                "proof leaves {} entries on the stack",
                self.stack.len()
            )));
        }
        match self.stack.pop() {
            Some(Slot::Proven {
                expr: Expression::SimpleInclusion { principal, role },
                member,
                ..
            }) => Ok(VerifiedMembership {
                principal,
                role,
                member,
            }),
            _ => Err(DartError::invalid_proof(
                "proof does not conclude in a role",
            )),
        }
    }

    fn intersect(
        &mut self,
        to: Expression,
        to_id: &ExpressionId,
        from: &Expression,
        from_id: &ExpressionId,
        member: Principal,
    ) -> Result<()> {
        let Some((left, right)) = to.intersection_sides() else {
            return Err(DartError::invalid_proof(format!("{to} has no sides")));
        };
        if *from != left && *from != right {
            return Err(DartError::invalid_proof(format!(
                "{from} is not a side of {to}"
            )));
        }
        let symmetric = left == right;

        if let Some(Slot::Half { id, side, member: first }) = self.stack.last() {
            if id == to_id {
                if *first != member {
                    return Err(DartError::invalid_proof(format!(
                        "intersection {to} joins {first} with {member}"
                    )));
                }
                if side == from_id && !symmetric {
                    return Err(DartError::invalid_proof(format!(
                        "side {from} of {to} proven twice"
                    )));
                }
                self.stack.pop();
                return self.push(Slot::Proven {
                    expr: to,
                    id: to_id.clone(),
                    member,
                });
            }
        }

        self.push(Slot::Half {
            id: to_id.clone(),
            side: from_id.clone(),
            member,
        })
    }

    fn lookup(&self, id: &ExpressionId) -> Result<Expression> {
        self.store
            .expression(id)
            .cloned()
            .ok_or_else(|| DartError::invalid_proof(format!("unknown expression {id}")))
    }

    fn push(&mut self, slot: Slot) -> Result<()> {
        if self.stack.len() >= self.limit {
            return Err(DartError::invalid_proof(format!(
                "stack limit {} exceeded",
                self.limit
            )));
        }
        self.stack.push(slot);
        Ok(())
    }

    fn pop_proven(&mut self, expected: &ExpressionId) -> Result<Principal> {
        match self.stack.pop() {
            Some(Slot::Proven { id, member, .. }) if id == *expected => Ok(member),
            Some(Slot::Proven { expr, .. }) => Err(DartError::invalid_proof(format!(
                "expected proven {expected}, found {expr}"
            ))),
            Some(Slot::Half { id, .. }) => Err(DartError::invalid_proof(format!(
                "expected proven {expected}, found half of {id}"
            ))),
            None => Err(DartError::invalid_proof(format!(
                "stack empty while expecting {expected}"
            ))),
        }
    }
}
