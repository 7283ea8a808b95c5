//! ロール公理の飽和
//!
//! Completes the role axioms with the inverse-property consequences the
//! completion rules cannot derive on their own:
//!
//! - RI3(r, s, t) ⟹ RI3(s⁻, r⁻, t⁻)
//! - RI2(r, s) ⟹ RI2(r⁻, s⁻), when r or s has an inverse, repeated until
//!   no new inclusion appears

use crate::axiom::NormalizedAxiom;
use crate::entity::EntityManager;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Role-axiom saturation over a normalized ontology
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleSaturation;

impl RoleSaturation {
    pub fn new() -> Self {
        Self
    }

    /// Return `axioms` extended with their inverse consequences.
    ///
    /// The output is a superset of the input. Inverse properties are
    /// minted in `entities` on demand.
    pub fn saturate(&self, axioms: &BTreeSet<NormalizedAxiom>, entities: &mut EntityManager) -> BTreeSet<NormalizedAxiom> {
        let mut saturated = axioms.clone();

        // 合成公理は逆向きにも成り立つ
        for axiom in axioms {
            if let NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } = *axiom {
                let left = entities.inverse_of(right_sub_property);
                let right = entities.inverse_of(left_sub_property);
                let sup = entities.inverse_of(super_property);
                saturated.insert(NormalizedAxiom::ri3(left, right, sup));
            }
        }

        // 逆ロールの生成で新たに対象となる包含があるため不動点まで繰り返す
        loop {
            let inclusions: Vec<(_, _)> = saturated
                .iter()
                .filter_map(|axiom| match axiom {
                    NormalizedAxiom::Ri2 { sub_property, super_property } => Some((*sub_property, *super_property)),
                    _ => None,
                })
                .collect();
            let mut added = false;
            for (sub, sup) in inclusions {
                if entities.inverse_pair(sub).is_none() && entities.inverse_pair(sup).is_none() {
                    continue;
                }
                let sub_inverse = entities.inverse_of(sub);
                let sup_inverse = entities.inverse_of(sup);
                added |= saturated.insert(NormalizedAxiom::ri2(sub_inverse, sup_inverse));
            }
            if !added {
                break;
            }
        }

        let added = saturated.len() - axioms.len();
        if added > 0 {
            debug!("Role saturation added {} axioms", added);
        }
        info!("Role saturation finished with {} axioms", saturated.len());
        saturated
    }
}
