//! Mapeamento de membros do board para o roster do time
//!
//! Os nomes no Trello raramente batem exatamente com o roster ("Lancy Dizon" vs
//! "Lancey"). O mapeamento tenta dois métodos em ordem, para cada nome do roster:
//!
//! 1. [`names_match`]: variações de grafia e partes do nome como substring
//! 2. [`words_match`]: comparação palavra a palavra com tolerância de 2 letras
//!
//! Membros administrativos (por nome) nunca são mapeados.

use crate::matching::{name_variations, names_match, normalize, words_match};
use crate::types::Member;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Membro do board associado a um nome do roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedMember {
    pub member_id: String,
    pub team_name: String,
    pub trello_name: String,
    pub username: String,
}

/// Como um autor de comentário foi reconhecido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommenterMatch {
    /// ID do membro presente no mapeamento
    MemberId,
    /// Nome do autor bate com variação do nome do roster ou do Trello
    Name,
}

impl CommenterMatch {
    pub fn confidence(&self) -> u8 {
        match self {
            CommenterMatch::MemberId => 95,
            CommenterMatch::Name => 80,
        }
    }
}

/// Verifica se um nome pertence a um administrador
pub fn is_admin_name(full_name: &str, admin_names: &[String]) -> bool {
    let name = normalize(full_name);
    admin_names
        .iter()
        .map(|a| normalize(a))
        .filter(|a| !a.is_empty())
        .any(|a| name.contains(&a))
}

/// Mapa `member_id -> MappedMember`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberMapping {
    members: HashMap<String, MappedMember>,
}

impl MemberMapping {
    pub fn get(&self, member_id: &str) -> Option<&MappedMember> {
        self.members.get(member_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedMember> {
        self.members.values()
    }

    /// Membro do board associado a um nome do roster
    pub fn find_by_team_name(&self, team_name: &str) -> Option<&MappedMember> {
        let wanted = normalize(team_name);
        self.members
            .values()
            .find(|m| normalize(&m.team_name) == wanted)
    }

    /// Reconhece o autor de um comentário: primeiro pelo ID, depois pelo nome
    pub fn resolve_commenter(
        &self,
        member_id: &str,
        full_name: &str,
    ) -> Option<(&MappedMember, CommenterMatch)> {
        if let Some(mapped) = self.members.get(member_id) {
            return Some((mapped, CommenterMatch::MemberId));
        }

        let commenter = normalize(full_name);
        if commenter.is_empty() {
            return None;
        }

        // Ordenado por ID para resultado determinístico
        let mut candidates: Vec<&MappedMember> = self.members.values().collect();
        candidates.sort_by(|a, b| a.member_id.cmp(&b.member_id));

        candidates
            .into_iter()
            .find(|mapped| {
                name_variations(&mapped.team_name)
                    .into_iter()
                    .chain(name_variations(&mapped.trello_name))
                    .any(|v| commenter.contains(&v) || v.contains(&commenter))
            })
            .map(|mapped| (mapped, CommenterMatch::Name))
    }

    pub fn insert(&mut self, mapped: MappedMember) {
        self.members.insert(mapped.member_id.clone(), mapped);
    }
}

/// Constrói o mapeamento entre membros do board e nomes do roster
pub fn map_board_members(
    members: &[Member],
    team_names: &[String],
    admin_names: &[String],
) -> MemberMapping {
    let mut mapping = MemberMapping::default();

    for member in members {
        let full_name = member.full_name.trim();
        if full_name.is_empty() || member.id.is_empty() {
            continue;
        }
        if is_admin_name(full_name, admin_names) {
            tracing::debug!("Ignorando membro administrativo: {}", full_name);
            continue;
        }

        let matched = team_names
            .iter()
            .filter(|team| !is_admin_name(team, admin_names))
            .find(|team| names_match(team, full_name) || words_match(team, full_name));

        match matched {
            Some(team_name) => {
                tracing::debug!("✅ Membro '{}' mapeado para '{}'", full_name, team_name);
                mapping.insert(MappedMember {
                    member_id: member.id.clone(),
                    team_name: team_name.clone(),
                    trello_name: full_name.to_string(),
                    username: member.username.clone(),
                });
            }
            None => tracing::debug!("⚠️ Membro '{}' sem correspondência no time", full_name),
        }
    }

    mapping
}
